use thiserror::Error;

use crate::layer::LayerRole;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("coordinate {value} does not fit the {integer}.{decimal} coordinate format")]
    Overflow { value: f64, integer: u8, decimal: u8 },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("{role} layer, primitive {index}: {source}")]
    Primitive {
        role: LayerRole,
        index: usize,
        source: Box<Error>,
    },

    #[error("{role} layer: {source}")]
    Layer { role: LayerRole, source: Box<Error> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gerber serialization error: {0}")]
    Serialization(#[from] gerber_types::GerberError),
}

impl Error {
    /// Attaches the layer role and primitive index to an error raised while writing that primitive.
    pub(crate) fn at(self, role: LayerRole, index: usize) -> Self {
        Error::Primitive {
            role,
            index,
            source: Box::new(self),
        }
    }

    /// Attaches the layer role to an error raised while writing that layer, unless it already names it.
    pub(crate) fn in_layer(self, role: LayerRole) -> Self {
        match self {
            Error::Primitive {
                ..
            }
            | Error::Layer {
                ..
            } => self,
            other => Error::Layer {
                role,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with any layer/primitive context removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Primitive {
                source, ..
            }
            | Error::Layer {
                source, ..
            } => source.root(),
            other => other,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("font '{0}' is not registered")]
    Font(String),

    #[error("font '{font}' has no glyph for {ch:?}")]
    Glyph { font: String, ch: char },
}
