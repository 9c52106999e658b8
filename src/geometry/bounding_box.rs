use log::trace;

use crate::{Position, Vector};

#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub struct BoundingBox {
    pub min: Position,
    pub max: Position,
}

impl BoundingBox {
    pub fn new(min: Position, max: Position) -> Self {
        Self {
            min,
            max,
        }
    }

    /// Box of `half_size` in every direction around `center`, e.g. the stamp of a round aperture.
    pub fn around(center: Position, half_size: f64) -> Self {
        Self {
            min: Position::new(center.x - half_size, center.y - half_size),
            max: Position::new(center.x + half_size, center.y + half_size),
        }
    }

    pub fn expand(&mut self, other: &BoundingBox) {
        self.min.x = self.min.x.min(other.min.x);
        self.min.y = self.min.y.min(other.min.y);
        self.max.x = self.max.x.max(other.max.x);
        self.max.y = self.max.y.max(other.max.y);
    }

    pub fn expand_to_include(&mut self, position: Position) {
        self.min.x = self.min.x.min(position.x);
        self.min.y = self.min.y.min(position.y);
        self.max.x = self.max.x.max(position.x);
        self.max.y = self.max.y.max(position.y);
    }

    /// Componentwise union, the empty box is the identity.
    pub fn merge(&self, other: &BoundingBox) -> Self {
        let mut result = self.clone();
        result.expand(other);
        result
    }

    pub fn translate(&self, offset: Vector) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Position::new(f64::MAX, f64::MAX),
            max: Position::new(f64::MIN, f64::MIN),
        }
    }
}

impl BoundingBox {
    /// Note that a bounding box of 0,0 -> 0,0 is NOT empty
    /// e.g., a zero-length trace drawn with a zero-sized point still has a position.
    ///
    /// Only a bounding box which is the same as the one returned by `default` counts as empty.
    pub fn is_empty(&self) -> bool {
        self.eq(&BoundingBox::default())
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns the geometric center of the bounding box as a Position
    pub fn center(&self) -> Position {
        Position::new(self.min.x + self.max.x, self.min.y + self.max.y) / 2.0
    }

    /// Constructs a bounding box from a list of points
    pub fn from_points(points: &[Position]) -> Self {
        let mut bbox = BoundingBox::default();

        for position in points {
            bbox.expand_to_include(*position);
        }

        trace!("bbox from {} points: {:?}", points.len(), bbox);

        bbox
    }
}

#[cfg(test)]
mod bbox_tests {
    use rstest::rstest;

    use super::BoundingBox;
    use crate::{Position, Vector};

    #[rstest]
    #[case(BoundingBox::default(), true)]
    #[case(BoundingBox { min: Position::new(0.0, 0.0), max: Position::new(0.0, 0.0) }, false)]
    #[case(BoundingBox { min: Position::new(-10.0, -10.0), max: Position::new(10.0, 10.0) }, false)]
    pub fn test_is_empty(#[case] input: BoundingBox, #[case] expected: bool) {
        assert_eq!(input.is_empty(), expected);
    }

    #[test]
    pub fn test_merge_with_empty_is_identity() {
        let bbox = BoundingBox::new(Position::new(1.0, 2.0), Position::new(3.0, 4.0));

        assert_eq!(bbox.merge(&BoundingBox::default()), bbox);
        assert_eq!(BoundingBox::default().merge(&bbox), bbox);
    }

    #[test]
    pub fn test_merge_is_componentwise() {
        let a = BoundingBox::new(Position::new(0.0, -5.0), Position::new(1.0, 1.0));
        let b = BoundingBox::new(Position::new(-2.0, 0.0), Position::new(0.5, 7.0));

        let merged = a.merge(&b);

        assert_eq!(merged.min, Position::new(-2.0, -5.0));
        assert_eq!(merged.max, Position::new(1.0, 7.0));
    }

    #[test]
    pub fn test_translate_keeps_size() {
        let bbox = BoundingBox::new(Position::new(1.0, 2.0), Position::new(3.0, 5.0));

        let moved = bbox.translate(Vector::new(10.0, -1.0));

        assert_eq!(moved.min, Position::new(11.0, 1.0));
        assert_eq!(moved.width(), bbox.width());
        assert_eq!(moved.height(), bbox.height());
        assert!(BoundingBox::default().translate(Vector::new(1.0, 1.0)).is_empty());
    }

    #[test]
    pub fn test_from_points() {
        let bbox = BoundingBox::from_points(&[
            Position::new(3.0, -1.0),
            Position::new(-2.0, 4.0),
            Position::new(0.0, 0.0),
        ]);

        assert_eq!(bbox.min, Position::new(-2.0, -1.0));
        assert_eq!(bbox.max, Position::new(3.0, 4.0));
    }

    #[rstest]
    #[case((0.0, 0.0), (10.0, 10.0), (5.0, 5.0))] // Case 1: Origin 0, 10x10
    #[case((10.0, 10.0), (10.0, 10.0), (15.0, 15.0))] // Case 2: Origin 10, 10x10
    #[case((0.0, 0.0), (5.0, 10.0), (2.5, 5.0))] // Case 3: Origin 0, 5x10
    #[case((10.0, 10.0), (10.0, 5.0), (15.0, 12.5))] // Case 4: Origin 10, 10x5
    fn test_geometric_center(#[case] origin: (f64, f64), #[case] size: (f64, f64), #[case] expected: (f64, f64)) {
        // Create bounding box from origin and size
        let bbox = BoundingBox {
            min: Position::new(origin.0, origin.1),
            max: Position::new(origin.0 + size.0, origin.1 + size.1),
        };

        let center = bbox.center();

        // Compare with precision to handle floating-point numbers
        let epsilon = 1e-9;
        assert!(
            (center.x - expected.0).abs() < epsilon,
            "X mismatch: expected {}, got {}",
            expected.0,
            center.x
        );
        assert!(
            (center.y - expected.1).abs() < epsilon,
            "Y mismatch: expected {}, got {}",
            expected.1,
            center.y
        );
    }
}
