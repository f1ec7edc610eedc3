//! Trial water levels for the hydraulic sweep.
//!
//! Levels are evenly spaced between `min_elevation + offset` and
//! `max_elevation − offset`. The offset keeps the lowest level strictly above
//! the thalweg (a non-empty wetted region) and the highest strictly below the
//! top of the terrain.

use crate::domain::CrossSectionProfile;
use crate::error::ProfileError;

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps as f64 - 1.0);
            (0..steps)
                .map(|i| if i + 1 == steps { max } else { min + step * i as f64 })
                .collect()
        }
    }
}

/// Trial levels for a profile, or `FlatProfile` when its relief leaves no room
/// between the two offsets.
pub fn trial_levels(
    profile: &CrossSectionProfile,
    offset: f64,
    steps: usize,
) -> Result<Vec<f64>, ProfileError> {
    let required = 2.0 * offset;
    if profile.relief() <= required {
        return Err(ProfileError::FlatProfile {
            id: profile.id(),
            relief: profile.relief(),
            required,
        });
    }
    Ok(lin_space(
        profile.min_elevation() + offset,
        profile.max_elevation() - offset,
        steps,
    ))
}
