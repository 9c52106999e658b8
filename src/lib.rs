mod aperture;
mod config;
mod document;
mod error;
pub mod excellon;
mod font;
mod geometry;
pub mod gerber;
mod layer;
mod primitive;
pub mod quantize;
mod spacial;
pub mod text;
mod types;

pub use aperture::*;
pub use config::*;
pub use document::*;
pub use error::*;
pub use excellon::ExcellonWriter;
pub use font::*;
pub use geometry::*;
pub use gerber::GerberWriter;
/// re-export 'gerber_types' crate
#[cfg(feature = "types")]
pub use gerber_types;
pub use layer::*;
pub use primitive::*;
pub use quantize::Quantizer;
pub use spacial::*;
pub use text::{Anchor, HAlign, TextLayout, VAlign};
pub use types::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
