use serde::{Deserialize, Serialize};

/// Popup text shown for every cluster marker.
pub const CLUSTER_MARKER_POPUP: &str = "geo flood cluster";

/// A `(latitude, longitude)` pair in decimal degrees.
pub type LatLon = (f64, f64);

/// A point of interest placed on the map by a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub position: LatLon,
    #[serde(default)]
    pub label: Option<String>,
}

impl Marker {
    pub fn new(position: LatLon) -> Self {
        Self {
            position,
            label: None,
        }
    }

    pub fn labeled(position: LatLon, label: impl Into<String>) -> Self {
        Self {
            position,
            label: Some(label.into()),
        }
    }

    /// Label used in marker pickers: `"<label> (lat, lon)"` at four decimals,
    /// or just the coordinates when the marker has no label.
    pub fn display_label(&self) -> String {
        let (lat, lon) = self.position;
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => format!("{} ({:.4}, {:.4})", label, lat, lon),
            _ => format!("({:.4}, {:.4})", lat, lon),
        }
    }
}

/// A flood cluster centroid. Carries no label of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMarker {
    pub position: LatLon,
}

impl ClusterMarker {
    pub fn new(position: LatLon) -> Self {
        Self { position }
    }

    pub fn popup(&self) -> &'static str {
        CLUSTER_MARKER_POPUP
    }
}
