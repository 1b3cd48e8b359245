pub mod anchor;
pub mod header;
pub mod signatures;
pub mod vote;

pub use anchor::*;
pub use header::*;
pub use signatures::*;
pub use vote::*;
