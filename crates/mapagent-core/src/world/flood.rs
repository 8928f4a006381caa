//! Flood observation layer.

use serde::{Deserialize, Serialize};

use super::filter::FilterSettings;

/// A single flood detection point loaded by a data tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodObservation {
    pub latitude: f64,
    pub longitude: f64,
    /// Detection confidence within `[0, 1]`, read as flood intensity.
    pub flood_confidence: f64,
    pub feature_type: String,
}

impl FloodObservation {
    /// Whether this observation survives the given filters.
    pub fn is_visible_under(&self, filters: &FilterSettings) -> bool {
        filters.intensity_admits(self.flood_confidence)
            && filters.selected_feature_types.contains(&self.feature_type)
    }

    pub fn band(&self) -> IntensityBand {
        IntensityBand::from_confidence(self.flood_confidence)
    }
}

/// Coarse intensity buckets used for point colouring and the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityBand {
    /// Below 0.3
    Low,
    /// 0.3 up to 0.5
    Moderate,
    /// 0.5 up to 0.7
    High,
    /// 0.7 and above
    Severe,
}

impl IntensityBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence < 0.3 {
            IntensityBand::Low
        } else if confidence < 0.5 {
            IntensityBand::Moderate
        } else if confidence < 0.7 {
            IntensityBand::High
        } else {
            IntensityBand::Severe
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            IntensityBand::Low => "green",
            IntensityBand::Moderate => "yellow",
            IntensityBand::High => "orange",
            IntensityBand::Severe => "red",
        }
    }
}
