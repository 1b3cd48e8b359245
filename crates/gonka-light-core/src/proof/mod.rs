pub mod ics23;
pub mod inclusion;

pub use ics23::*;
pub use inclusion::*;
