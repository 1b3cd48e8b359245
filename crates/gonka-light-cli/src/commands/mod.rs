pub mod custody;
pub mod inclusion;
