use std::fmt;

use crate::error::Result;
use crate::geometry::BoundingBox;
use crate::primitive::{Primitive, RenderContext};

/// The fixed catalog of board layers a document can hold.
///
/// Variant order is stack order, top to bottom, followed by the non-copper layers, which is also the order
/// layers are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerRole {
    TopCopper,
    /// Internal copper layer `n`, counted from the top layer which is layer 1, so `n >= 2`.
    InnerCopper(u8),
    BottomCopper,
    TopSolderMask,
    BottomSolderMask,
    TopSilkscreen,
    BottomSilkscreen,
    Outline,
    Drill,
}

impl LayerRole {
    /// File name extension, without the dot.
    pub fn extension(&self) -> String {
        match self {
            LayerRole::TopCopper => "gtl".to_string(),
            LayerRole::InnerCopper(index) => format!("g{}", index),
            LayerRole::BottomCopper => "gbl".to_string(),
            LayerRole::TopSolderMask => "gts".to_string(),
            LayerRole::BottomSolderMask => "gbs".to_string(),
            LayerRole::TopSilkscreen => "gto".to_string(),
            LayerRole::BottomSilkscreen => "gbo".to_string(),
            LayerRole::Outline => "gko".to_string(),
            LayerRole::Drill => "xln".to_string(),
        }
    }

    pub fn file_name(&self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.extension())
    }

    pub fn is_drill(&self) -> bool {
        matches!(self, LayerRole::Drill)
    }

    /// Value of the `.FileFunction` attribute, `None` for the drill layer, which is not a Gerber file.
    ///
    /// `copper_layers` is the number of copper layers in the board, which numbers the bottom layer.
    pub fn file_function(&self, copper_layers: u8) -> Option<String> {
        let function = match self {
            LayerRole::TopCopper => "Copper,L1,Top".to_string(),
            LayerRole::InnerCopper(index) => format!("Copper,L{},Inr", index),
            LayerRole::BottomCopper => format!("Copper,L{},Bot", copper_layers),
            LayerRole::TopSolderMask => "Soldermask,Top".to_string(),
            LayerRole::BottomSolderMask => "Soldermask,Bot".to_string(),
            LayerRole::TopSilkscreen => "Legend,Top".to_string(),
            LayerRole::BottomSilkscreen => "Legend,Bot".to_string(),
            LayerRole::Outline => "Profile,NP".to_string(),
            LayerRole::Drill => return None,
        };
        Some(function)
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerRole::TopCopper => f.write_str("top copper"),
            LayerRole::InnerCopper(index) => write!(f, "inner copper {}", index),
            LayerRole::BottomCopper => f.write_str("bottom copper"),
            LayerRole::TopSolderMask => f.write_str("top solder mask"),
            LayerRole::BottomSolderMask => f.write_str("bottom solder mask"),
            LayerRole::TopSilkscreen => f.write_str("top silkscreen"),
            LayerRole::BottomSilkscreen => f.write_str("bottom silkscreen"),
            LayerRole::Outline => f.write_str("outline"),
            LayerRole::Drill => f.write_str("drill"),
        }
    }
}

/// An append-only sequence of primitives for one layer role.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    role: LayerRole,
    primitives: Vec<Primitive>,
}

impl Layer {
    pub fn new(role: LayerRole) -> Self {
        Self {
            role,
            primitives: Vec::new(),
        }
    }

    pub fn role(&self) -> LayerRole {
        self.role
    }

    pub fn add(&mut self, primitive: impl Into<Primitive>) -> &mut Self {
        self.primitives.push(primitive.into());
        self
    }

    pub fn extend<P: Into<Primitive>>(&mut self, primitives: impl IntoIterator<Item = P>) -> &mut Self {
        self.primitives
            .extend(primitives.into_iter().map(Into::into));
        self
    }

    /// Primitives in the order they were added.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Union of the primitive boxes, empty for an empty layer.
    pub fn bounding_box(&self, context: &RenderContext) -> Result<BoundingBox> {
        let mut bbox = BoundingBox::default();
        for (index, primitive) in self.primitives.iter().enumerate() {
            let primitive_bbox = primitive
                .bounding_box(context)
                .map_err(|error| error.at(self.role, index))?;
            bbox.expand(&primitive_bbox);
        }
        Ok(bbox)
    }
}
