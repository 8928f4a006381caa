//! Shared world state module.
//!
//! `WorldState` is the mutable model of map entities and display settings
//! that the agent pipeline's tools and direct UI actions both write to.
//! `WorldHandle` is the shared, synchronously-locked reference handed to
//! those collaborators.
//!
//! # Module Structure
//!
//! - `marker`: `Marker`, `ClusterMarker`
//! - `filter`: `FilterSettings`, `MapType`
//! - `draw`: `DrawInfo`
//! - `flood`: `FloodObservation`, `IntensityBand`

mod draw;
mod filter;
mod flood;
mod marker;

pub use draw::DrawInfo;
pub use filter::{FilterSettings, MapType};
pub use flood::{FloodObservation, IntensityBand};
pub use marker::{CLUSTER_MARKER_POPUP, ClusterMarker, LatLon, Marker};

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{MapAgentError, Result};

/// Map centre and zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: (0.0, 0.0),
            zoom: 2,
        }
    }
}

/// The mutable model shared by tools, the UI and `DrawSync`.
///
/// Marker and cluster-marker collections keep insertion order for the whole
/// session; removing an entry never reorders the survivors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    markers: Vec<Marker>,
    cluster_markers: Vec<ClusterMarker>,
    filters: FilterSettings,
    draw_info: Option<DrawInfo>,
    draw_revision: u64,
    view: MapView,
    flood_observations: Vec<FloodObservation>,
    show_flood_data: bool,
}

impl WorldState {
    /// Creates an empty world centred on the given view.
    pub fn new(view: MapView) -> Self {
        Self {
            view,
            ..Default::default()
        }
    }

    // ============================================================================
    // Markers
    // ============================================================================

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Appends a marker and returns its index.
    pub fn add_marker(&mut self, marker: Marker) -> usize {
        self.markers.push(marker);
        self.markers.len() - 1
    }

    /// Removes the marker at `index`, shifting later markers down by one.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index` is past the end.
    pub fn remove_marker(&mut self, index: usize) -> Result<Marker> {
        check_index("Marker", index, self.markers.len())?;
        Ok(self.markers.remove(index))
    }

    /// Removes every marker matching `predicate` and returns how many went.
    pub fn remove_markers_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Marker) -> bool,
    {
        let before = self.markers.len();
        self.markers.retain(|marker| !predicate(marker));
        before - self.markers.len()
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    // ============================================================================
    // Cluster markers
    // ============================================================================

    pub fn cluster_markers(&self) -> &[ClusterMarker] {
        &self.cluster_markers
    }

    /// Appends a cluster marker and returns its index.
    pub fn add_cluster_marker(&mut self, marker: ClusterMarker) -> usize {
        self.cluster_markers.push(marker);
        self.cluster_markers.len() - 1
    }

    /// Removes the cluster marker at `index`, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index` is past the end.
    pub fn remove_cluster_marker(&mut self, index: usize) -> Result<ClusterMarker> {
        check_index("ClusterMarker", index, self.cluster_markers.len())?;
        Ok(self.cluster_markers.remove(index))
    }

    pub fn clear_cluster_markers(&mut self) {
        self.cluster_markers.clear();
    }

    // ============================================================================
    // Filters and view
    // ============================================================================

    pub fn filter_settings(&self) -> &FilterSettings {
        &self.filters
    }

    /// Replaces the filter settings after validating them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilter` and leaves the current settings untouched if
    /// `settings` fails validation.
    pub fn set_filter_settings(&mut self, settings: FilterSettings) -> Result<()> {
        settings.validate()?;
        self.filters = settings;
        Ok(())
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn set_center(&mut self, center: LatLon) {
        self.view.center = center;
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.view.zoom = zoom;
    }

    // ============================================================================
    // Draw info
    // ============================================================================

    pub fn draw_info(&self) -> Option<&DrawInfo> {
        self.draw_info.as_ref()
    }

    /// Stores a new draw report. Every call counts as one write.
    pub fn set_draw_info(&mut self, info: Option<DrawInfo>) {
        self.draw_info = info;
        self.draw_revision += 1;
    }

    /// Number of times the draw info has been written this session.
    pub fn draw_revision(&self) -> u64 {
        self.draw_revision
    }

    // ============================================================================
    // Flood layer
    // ============================================================================

    pub fn flood_observations(&self) -> &[FloodObservation] {
        &self.flood_observations
    }

    pub fn set_flood_observations(&mut self, observations: Vec<FloodObservation>) {
        self.flood_observations = observations;
    }

    pub fn show_flood_data(&self) -> bool {
        self.show_flood_data
    }

    pub fn set_show_flood_data(&mut self, show: bool) {
        self.show_flood_data = show;
    }

    /// Observations the renderer should draw under the current filters.
    ///
    /// Empty while the flood layer is switched off.
    pub fn visible_flood_observations(&self) -> Vec<&FloodObservation> {
        if !self.show_flood_data {
            return Vec::new();
        }
        self.flood_observations
            .iter()
            .filter(|obs| obs.is_visible_under(&self.filters))
            .collect()
    }
}

fn check_index(entity_type: &str, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(MapAgentError::IndexOutOfRange {
            entity_type: entity_type.to_string(),
            index,
            len,
        });
    }
    Ok(())
}

/// Shared reference to a session's `WorldState`.
///
/// All access is synchronous; a write is visible to the very next read.
/// A poisoned lock is recovered rather than propagated, since every write
/// leaves the state structurally valid.
#[derive(Debug, Clone, Default)]
pub struct WorldHandle {
    inner: Arc<RwLock<WorldState>>,
}

impl WorldHandle {
    pub fn new(state: WorldState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Runs `f` with shared access to the state.
    pub fn read<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    /// Runs `f` with exclusive access to the state.
    pub fn write<R>(&self, f: impl FnOnce(&mut WorldState) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    /// Clones the current state.
    pub fn snapshot(&self) -> WorldState {
        self.read(WorldState::clone)
    }

    /// Replaces the whole state, e.g. with an earlier snapshot.
    pub fn restore(&self, state: WorldState) {
        self.write(|world| *world = state);
    }

    /// Whether two handles point at the same underlying state.
    pub fn same_world(&self, other: &WorldHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_removal_preserves_survivor_order() {
        let mut world = WorldState::default();
        world.add_marker(Marker::labeled((0.0, 0.0), "a"));
        world.add_marker(Marker::labeled((1.0, 1.0), "b"));
        world.add_marker(Marker::labeled((2.0, 2.0), "c"));

        let removed = world.remove_marker(1).unwrap();
        assert_eq!(removed.label.as_deref(), Some("b"));

        let labels: Vec<_> = world
            .markers()
            .iter()
            .map(|m| m.label.clone().unwrap())
            .collect();
        assert_eq!(labels, vec!["a", "c"]);
    }

    #[test]
    fn test_remove_out_of_range_is_an_error() {
        let mut world = WorldState::default();
        world.add_cluster_marker(ClusterMarker::new((5.0, 5.0)));
        let err = world.remove_cluster_marker(3).unwrap_err();
        assert_eq!(
            err,
            MapAgentError::IndexOutOfRange {
                entity_type: "ClusterMarker".to_string(),
                index: 3,
                len: 1,
            }
        );
        assert_eq!(world.cluster_markers().len(), 1);
    }

    #[test]
    fn test_remove_markers_where_keeps_order() {
        let mut world = WorldState::default();
        for i in 0..5 {
            world.add_marker(Marker::new((i as f64, 0.0)));
        }
        let removed = world.remove_markers_where(|m| m.position.0 as i64 % 2 == 1);
        assert_eq!(removed, 2);
        let lats: Vec<f64> = world.markers().iter().map(|m| m.position.0).collect();
        assert_eq!(lats, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_invalid_filter_leaves_settings_untouched() {
        let mut world = WorldState::default();
        let bad = FilterSettings {
            opacity: -0.1,
            ..Default::default()
        };
        assert!(world.set_filter_settings(bad).is_err());
        assert_eq!(world.filter_settings(), &FilterSettings::default());
    }

    #[test]
    fn test_visible_flood_observations_respects_toggle_and_filters() {
        let mut world = WorldState::default();
        world.set_flood_observations(vec![
            FloodObservation {
                latitude: 0.0,
                longitude: 0.0,
                flood_confidence: 0.2,
                feature_type: "river".to_string(),
            },
            FloodObservation {
                latitude: 1.0,
                longitude: 1.0,
                flood_confidence: 0.9,
                feature_type: "coast".to_string(),
            },
        ]);
        let mut filters = FilterSettings::default();
        filters.selected_feature_types.insert("coast".to_string());
        world.set_filter_settings(filters).unwrap();

        assert!(world.visible_flood_observations().is_empty());

        world.set_show_flood_data(true);
        let visible = world.visible_flood_observations();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].feature_type, "coast");
    }

    #[test]
    fn test_handle_writes_are_immediately_visible() {
        let handle = WorldHandle::new(WorldState::new(MapView {
            center: (10.0, 20.0),
            zoom: 5,
        }));
        let other = handle.clone();
        other.write(|w| {
            w.add_marker(Marker::new((10.0, 20.0)));
            w.set_zoom(9);
        });
        assert_eq!(handle.read(|w| w.markers().len()), 1);
        assert_eq!(handle.read(|w| w.view().zoom), 9);
        assert!(handle.same_world(&other));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let handle = WorldHandle::default();
        let before = handle.snapshot();
        handle.write(|w| {
            w.add_marker(Marker::new((1.0, 1.0)));
        });
        handle.restore(before.clone());
        assert_eq!(handle.snapshot(), before);
    }
}
