pub mod chain;
pub mod participants;
pub mod proof;

pub use chain::*;
pub use participants::*;
pub use proof::*;
