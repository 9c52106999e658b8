//! Polygonal approximation of circular arcs.
//!
//! A chord spanning the angle `θ` of a circle of radius `r` deviates from the arc by at most its sagitta,
//! `r * (1 - cos(θ / 2))`. Solving for `θ` gives the largest step that stays within a tolerance.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{Error, Result};

/// Most chords a single arc may be split into.
pub const MAX_SEGMENTS: usize = 1 << 20;

/// Largest angular step, in radians, whose chord stays within `tolerance` of a circle of `radius`.
pub fn max_step_radians(radius: f64, tolerance: f64) -> f64 {
    if tolerance >= radius {
        return PI;
    }
    2.0 * (1.0 - tolerance / radius).acos()
}

/// Number of chords needed to approximate `sweep_radians` of a circle of `radius` within `tolerance`.
///
/// Never more than a quarter turn per chord, and always at least one chord. A tolerance so fine relative to the
/// radius that the arc would need more than [`MAX_SEGMENTS`] chords is a geometry error.
pub fn segment_count(radius: f64, sweep_radians: f64, tolerance: f64) -> Result<usize> {
    let sweep = sweep_radians.abs();
    if radius <= 0.0 || sweep == 0.0 {
        return Ok(1);
    }

    let step = max_step_radians(radius, tolerance).min(FRAC_PI_2);
    let count = sweep / step;
    if !(step > 0.0 && count <= MAX_SEGMENTS as f64) {
        return Err(Error::Geometry(format!(
            "tolerance {} is too fine for radius {}, more than {} chords needed",
            tolerance, radius, MAX_SEGMENTS
        )));
    }

    Ok((count.ceil() as usize).max(1))
}

/// Maximum distance between a chord spanning `step_radians` and the arc it replaces.
pub fn chord_deviation(radius: f64, step_radians: f64) -> f64 {
    radius * (1.0 - (step_radians.abs() / 2.0).cos())
}
