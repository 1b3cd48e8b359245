pub mod source;
pub mod walker;

#[cfg(test)]
pub(crate) mod testkit;

pub use source::*;
pub use walker::*;
