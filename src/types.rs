use std::fmt;

use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    /// Aka 'Negative' in Geometry
    Clockwise,
    /// Aka 'Positive' in Geometry
    CounterClockwise,
}

impl Winding {
    pub fn from_vertices(vertices: &[Position]) -> Self {
        if signed_area(vertices) < 0.0 {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }
}

/// Shoelace area, positive for counter-clockwise contours.
pub fn signed_area(vertices: &[Position]) -> f64 {
    let mut sum = 0.0;
    for i in 0..vertices.len() {
        let j = (i + 1) % vertices.len();
        sum += vertices[i].x * vertices[j].y - vertices[j].x * vertices[i].y;
    }
    sum / 2.0
}

/// Region polarity. `Add` is a dark region, `CutOut` clears whatever was drawn before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Exposure {
    CutOut,
    Add,
}

impl From<bool> for Exposure {
    fn from(value: bool) -> Self {
        match value {
            true => Exposure::Add,
            false => Exposure::CutOut,
        }
    }
}

/// End-cap shape of a stroked trace, which is also the shape of the aperture drawing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Circle,
    Rect,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Circle => f.write_str("circle"),
            Shape::Rect => f.write_str("rect"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], Winding::CounterClockwise)]
    #[case(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)], Winding::Clockwise)]
    fn test_winding(#[case] vertices: Vec<(f64, f64)>, #[case] expected: Winding) {
        let vertices: Vec<Position> = vertices
            .into_iter()
            .map(|(x, y)| Position::new(x, y))
            .collect();
        assert_eq!(Winding::from_vertices(&vertices), expected);
    }

    #[test]
    fn test_unit_square_area() {
        let vertices = [
            Position::new(0.0, 0.0),
            Position::new(2.0, 0.0),
            Position::new(2.0, 3.0),
            Position::new(0.0, 3.0),
        ];
        assert_eq!(signed_area(&vertices), 6.0);
    }
}
