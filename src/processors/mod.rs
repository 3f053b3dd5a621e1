//! Low-level image and geometry processors shared by the pipeline stages.

pub mod binarize;
pub mod geometry;

pub use geometry::{Point, Rect};
