//! Predefined read queries.

pub mod overview;

pub use overview::{FileEntry, LabelCount, Overview, TopNode};
