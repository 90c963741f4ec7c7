//! Rendering of the final ranking.

pub mod generator;

pub use generator::*;
