//! Project lifecycle state carried on the graph's Project node.

pub mod model;
