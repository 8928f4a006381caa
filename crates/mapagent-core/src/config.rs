//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::error::{MapAgentError, Result};
use crate::world::{LatLon, MapView};

/// Highest zoom level accepted by the tile providers.
pub const MAX_ZOOM: u8 = 22;

/// Tunables for one session.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Speaker name of the assistant in the diagnostic stream.
    pub assistant_name: String,
    /// Speaker name of the user proxy the assistant talks to.
    pub proxy_name: String,
    /// Default number of turns returned by `recent_traces`.
    pub recent_trace_limit: usize,
    /// Upper bound on one pipeline run; `0` disables the timeout.
    pub dispatch_timeout_secs: u64,
    /// Snapshot the world before dispatch and restore it if the turn fails.
    pub restore_world_on_failure: bool,
    pub map: MapConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            assistant_name: "map_assistant".to_string(),
            proxy_name: "user_proxy".to_string(),
            recent_trace_limit: 3,
            dispatch_timeout_secs: 300,
            restore_world_on_failure: false,
            map: MapConfig::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub center: LatLon,
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        let view = MapView::default();
        Self {
            center: view.center,
            zoom: view.zoom,
        }
    }
}

impl MapConfig {
    pub fn initial_view(&self) -> MapView {
        MapView {
            center: self.center,
            zoom: self.zoom,
        }
    }
}

impl SessionConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SessionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.assistant_name.trim().is_empty() {
            return Err(MapAgentError::config("assistant_name must not be empty"));
        }
        if self.proxy_name.trim().is_empty() {
            return Err(MapAgentError::config("proxy_name must not be empty"));
        }
        let (lat, lon) = self.map.center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(MapAgentError::config(format!(
                "map.center ({}, {}) is not a valid coordinate",
                lat, lon
            )));
        }
        if self.map.zoom > MAX_ZOOM {
            return Err(MapAgentError::config(format!(
                "map.zoom {} exceeds maximum {}",
                self.map.zoom, MAX_ZOOM
            )));
        }
        Ok(())
    }

    /// The configured timeout, `None` when disabled.
    pub fn dispatch_timeout(&self) -> Option<std::time::Duration> {
        (self.dispatch_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.dispatch_timeout_secs))
    }

    /// Speaker prefix the assistant's lines start with, e.g.
    /// `"map_assistant (to user_proxy):"`.
    pub fn speaker_prefix(&self) -> String {
        format!("{} (to {}):", self.assistant_name, self.proxy_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.speaker_prefix(), "map_assistant (to user_proxy):");
        assert_eq!(config.recent_trace_limit, 3);
    }

    #[test]
    fn test_partial_document_overrides_fields() {
        let config = SessionConfig::from_toml_str(
            r#"
            assistant_name = "geo_bot"
            dispatch_timeout_secs = 0

            [map]
            center = [35.68, 139.76]
            "#,
        )
        .unwrap();
        assert_eq!(config.assistant_name, "geo_bot");
        assert_eq!(config.proxy_name, "user_proxy");
        assert!(config.dispatch_timeout().is_none());
        assert_eq!(config.map.center, (35.68, 139.76));
        assert_eq!(config.map.zoom, 2);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(SessionConfig::from_toml_str("[map]\nzoom = 30").is_err());
        assert!(SessionConfig::from_toml_str("[map]\ncenter = [95.0, 0.0]").is_err());
        assert!(SessionConfig::from_toml_str("proxy_name = \"  \"").is_err());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = SessionConfig {
            restore_world_on_failure: true,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
    }
}
