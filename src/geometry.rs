mod bounding_box;
pub mod flattening;

pub use bounding_box::*;
