/// A point in board space, in millimeters.
pub type Position = nalgebra::Point2<f64>;
pub type Vector = nalgebra::Vector2<f64>;

pub trait Rotate {
    /// Rotates counter-clockwise about the coordinate origin.
    fn rotate_degrees(self, degrees: f64) -> Self;
}

impl Rotate for Position {
    fn rotate_degrees(self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return self;
        }
        let (sin_theta, cos_theta) = degrees.to_radians().sin_cos();
        Position::new(
            self.x * cos_theta - self.y * sin_theta,
            self.y * cos_theta + self.x * sin_theta,
        )
    }
}

pub fn is_finite(position: &Position) -> bool {
    position.x.is_finite() && position.y.is_finite()
}

pub mod deduplicate {
    use crate::Position;

    pub trait DedupEpsilon {
        /// Removes adjacent vertices closer than `epsilon`, treating the sequence as a closed contour,
        /// so a trailing copy of the first vertex is removed too.
        fn dedup_with_epsilon(self, epsilon: f64) -> Self;
    }

    fn coincident(a: &Position, b: &Position, epsilon: f64) -> bool {
        (a.x - b.x).abs() < epsilon && (a.y - b.y).abs() < epsilon
    }

    impl DedupEpsilon for Vec<Position> {
        fn dedup_with_epsilon(mut self, epsilon: f64) -> Self {
            self.dedup_by(|b, a| coincident(a, b, epsilon));

            while self.len() > 1 && coincident(&self[0], &self[self.len() - 1], epsilon) {
                self.pop();
            }

            self
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_empty_vec() {
            let vertices: Vec<Position> = vec![];
            let result = vertices.dedup_with_epsilon(0.001);
            assert!(result.is_empty());
        }

        #[test]
        fn test_no_duplicates() {
            let vertices = vec![
                Position::new(0.0, 0.0),
                Position::new(1.0, 1.0),
                Position::new(2.0, 0.0),
            ];

            let expected_result = vertices.clone();

            // when
            let result = vertices.dedup_with_epsilon(0.0001);

            // then
            assert_eq!(result, expected_result);
        }

        #[test]
        fn test_closing_vertex_removed() {
            let vertices = vec![
                Position::new(0.0, 0.0),
                Position::new(0.0, 0.0),
                Position::new(1.0, 0.0),
                Position::new(1.0, 1.0),
                Position::new(0.0, 0.0000001),
            ];
            let result = vertices.dedup_with_epsilon(1e-6);
            assert_eq!(result, vec![
                Position::new(0.0, 0.0),
                Position::new(1.0, 0.0),
                Position::new(1.0, 1.0),
            ]);
        }
    }
}
