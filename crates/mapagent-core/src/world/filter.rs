//! Display filter settings for the flood layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{MapAgentError, Result};

/// Base tile layer of the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    #[default]
    Standard,
    Terrain,
    Satellite,
}

/// Filters applied to the flood observation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Inclusive `(min, max)` window over flood confidence, both within `[0, 1]`.
    pub intensity_range: (f64, f64),
    /// Feature types that stay visible.
    pub selected_feature_types: BTreeSet<String>,
    pub map_type: MapType,
    /// Tile layer opacity within `[0, 1]`.
    pub opacity: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            intensity_range: (0.0, 1.0),
            selected_feature_types: BTreeSet::new(),
            map_type: MapType::Standard,
            opacity: 1.0,
        }
    }
}

impl FilterSettings {
    /// Checks every range invariant.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilter` if a bound lies outside `[0, 1]`, the intensity
    /// window is inverted, or a value is NaN.
    pub fn validate(&self) -> Result<()> {
        let (min, max) = self.intensity_range;
        if !unit_interval(min) || !unit_interval(max) {
            return Err(MapAgentError::invalid_filter(format!(
                "intensity range ({}, {}) must lie within [0, 1]",
                min, max
            )));
        }
        if min > max {
            return Err(MapAgentError::invalid_filter(format!(
                "intensity range min {} exceeds max {}",
                min, max
            )));
        }
        if !unit_interval(self.opacity) {
            return Err(MapAgentError::invalid_filter(format!(
                "opacity {} must lie within [0, 1]",
                self.opacity
            )));
        }
        Ok(())
    }

    /// Whether a confidence value falls inside the intensity window.
    pub fn intensity_admits(&self, confidence: f64) -> bool {
        let (min, max) = self.intensity_range;
        confidence >= min && confidence <= max
    }
}

fn unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FilterSettings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let settings = FilterSettings {
            intensity_range: (0.8, 0.2),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(MapAgentError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_opacity_and_nan() {
        let settings = FilterSettings {
            opacity: 1.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = FilterSettings {
            intensity_range: (f64::NAN, 1.0),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_intensity_window_is_inclusive() {
        let settings = FilterSettings {
            intensity_range: (0.3, 0.7),
            ..Default::default()
        };
        assert!(settings.intensity_admits(0.3));
        assert!(settings.intensity_admits(0.7));
        assert!(!settings.intensity_admits(0.71));
    }
}
