use std::collections::HashMap;
use std::hash::Hash;

use log::trace;

use crate::error::Result;
use crate::quantize::Quantizer;
use crate::types::Shape;

/// D-codes 0..=9 are reserved for operations, user apertures start at D10.
pub const FIRST_APERTURE_CODE: i32 = 10;

/// Excellon tool numbers start at T1.
pub const FIRST_TOOL_CODE: i32 = 1;

/// Assigns increasing numeric codes to keys in the order they are first registered.
#[derive(Debug, Clone)]
pub struct CodeTable<K> {
    first_code: i32,
    codes: HashMap<K, i32>,
    keys: Vec<K>,
}

impl<K: Eq + Hash + Clone> CodeTable<K> {
    pub fn new(first_code: i32) -> Self {
        Self {
            first_code,
            codes: HashMap::new(),
            keys: Vec::new(),
        }
    }

    /// Returns the code of `key`, assigning the next unused code on first registration.
    pub fn register(&mut self, key: K) -> i32 {
        if let Some(code) = self.codes.get(&key) {
            return *code;
        }

        let code = self.first_code + self.keys.len() as i32;
        self.codes.insert(key.clone(), code);
        self.keys.push(key);
        code
    }

    pub fn get(&self, key: &K) -> Option<i32> {
        self.codes.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entries in increasing code order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &K)> {
        self.keys
            .iter()
            .enumerate()
            .map(move |(index, key)| (self.first_code + index as i32, key))
    }
}

/// The tool a shape needs: a cap shape and a size in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aperture {
    pub shape: Shape,
    pub size: f64,
}

impl Aperture {
    pub fn new(shape: Shape, size: f64) -> Self {
        Self {
            shape,
            size,
        }
    }

    pub fn circle(diameter: f64) -> Self {
        Self::new(Shape::Circle, diameter)
    }
}

/// An aperture after quantization, so structurally equal apertures share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApertureKey {
    pub shape: Shape,
    pub size: i64,
}

/// Per-layer aperture table, rebuilt every time a layer is written.
#[derive(Debug, Clone)]
pub struct ApertureTable {
    quantizer: Quantizer,
    table: CodeTable<ApertureKey>,
}

impl ApertureTable {
    pub fn new(quantizer: Quantizer) -> Self {
        Self {
            quantizer,
            table: CodeTable::new(FIRST_APERTURE_CODE),
        }
    }

    pub fn key(&self, aperture: &Aperture) -> Result<ApertureKey> {
        Ok(ApertureKey {
            shape: aperture.shape,
            size: self.quantizer.dimension(aperture.size)?,
        })
    }

    pub fn register(&mut self, aperture: &Aperture) -> Result<i32> {
        let key = self.key(aperture)?;
        let code = self.table.register(key);
        trace!("aperture {:?} -> D{}", aperture, code);
        Ok(code)
    }

    pub fn code(&self, aperture: &Aperture) -> Result<Option<i32>> {
        Ok(self.table.get(&self.key(aperture)?))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Aperture definitions in code order, sizes in output units at the document precision.
    pub fn definitions(&self) -> Vec<gerber_types::ApertureDefinition> {
        self.table
            .iter()
            .map(|(code, key)| {
                let size = self.quantizer.to_units(key.size);
                let aperture = match key.shape {
                    Shape::Circle => gerber_types::Aperture::Circle(gerber_types::Circle::new(size)),
                    Shape::Rect => gerber_types::Aperture::Rectangle(gerber_types::Rectangular::new(size, size)),
                };
                gerber_types::ApertureDefinition::new(code, aperture)
            })
            .collect()
    }
}

/// Excellon tools keyed by quantized hole diameter.
#[derive(Debug, Clone)]
pub struct ToolTable {
    quantizer: Quantizer,
    table: CodeTable<i64>,
}

impl ToolTable {
    pub fn new(quantizer: Quantizer) -> Self {
        Self {
            quantizer,
            table: CodeTable::new(FIRST_TOOL_CODE),
        }
    }

    pub fn register(&mut self, diameter: f64) -> Result<i32> {
        let key = self.quantizer.dimension(diameter)?;
        Ok(self.table.register(key))
    }

    pub fn code(&self, diameter: f64) -> Result<Option<i32>> {
        Ok(self.table.get(&self.quantizer.dimension(diameter)?))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// `(tool, diameter in output units)` in tool order.
    pub fn tools(&self) -> Vec<(i32, f64)> {
        self.table
            .iter()
            .map(|(code, size)| (code, self.quantizer.to_units(*size)))
            .collect()
    }
}
