use mapagent_core::WorldHandle;
use mapagent_core::world::DrawInfo;
use std::sync::{Mutex, PoisonError};

/// Propagates externally reported draw events into `WorldState`.
///
/// The map widget re-reports its current drawing on every redraw. Only a
/// report that differs structurally from the previous one reaches the world,
/// so each distinct report causes exactly one write.
#[derive(Debug)]
pub struct DrawSync {
    world: WorldHandle,
    previous: Mutex<Option<DrawInfo>>,
}

impl DrawSync {
    /// Creates a reconciler whose previous report is the absent sentinel.
    pub fn new(world: WorldHandle) -> Self {
        Self {
            world,
            previous: Mutex::new(None),
        }
    }

    /// Applies one draw report.
    ///
    /// # Returns
    ///
    /// `true` if the report differed and was written, `false` for a repeat.
    pub fn on_draw_report(&self, report: Option<DrawInfo>) -> bool {
        let mut previous = self.previous.lock().unwrap_or_else(PoisonError::into_inner);
        if *previous == report {
            tracing::trace!("[DrawSync] Ignoring repeated draw report");
            return false;
        }

        self.world.write(|world| world.set_draw_info(report.clone()));
        *previous = report;
        tracing::debug!("[DrawSync] Draw info updated");
        true
    }

    /// The last report that was written through.
    pub fn previous(&self) -> Option<DrawInfo> {
        self.previous
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets the previous report, e.g. after the world was replaced.
    pub(crate) fn reset(&self) {
        self.resync(None);
    }

    /// Aligns the previous report with draw info the world was rewound to,
    /// so the next report of anything else is written through again.
    pub(crate) fn resync(&self, current: Option<DrawInfo>) {
        *self.previous.lock().unwrap_or_else(PoisonError::into_inner) = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(value: serde_json::Value) -> Option<DrawInfo> {
        Some(DrawInfo::new(value))
    }

    #[test]
    fn test_repeated_report_writes_once() {
        let world = WorldHandle::default();
        let sync = DrawSync::new(world.clone());
        let drawing = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]]});

        assert!(sync.on_draw_report(report(drawing.clone())));
        assert!(!sync.on_draw_report(report(drawing.clone())));

        assert_eq!(world.read(|w| w.draw_revision()), 1);
        assert_eq!(
            world.read(|w| w.draw_info().cloned()),
            report(drawing.clone())
        );
        assert_eq!(sync.previous(), report(drawing));
    }

    #[test]
    fn test_initial_absent_report_is_a_repeat() {
        let world = WorldHandle::default();
        let sync = DrawSync::new(world.clone());

        assert!(!sync.on_draw_report(None));
        assert_eq!(world.read(|w| w.draw_revision()), 0);
    }

    #[test]
    fn test_distinct_reports_each_write() {
        let world = WorldHandle::default();
        let sync = DrawSync::new(world.clone());

        assert!(sync.on_draw_report(report(json!({"zoom": 4}))));
        assert!(sync.on_draw_report(report(json!({"zoom": 5}))));
        assert!(sync.on_draw_report(None));
        assert!(sync.on_draw_report(report(json!({"zoom": 5}))));

        assert_eq!(world.read(|w| w.draw_revision()), 4);
    }

    #[test]
    fn test_resync_after_rewind_accepts_same_report_again() {
        let world = WorldHandle::default();
        let sync = DrawSync::new(world.clone());
        let before = world.snapshot();

        assert!(sync.on_draw_report(report(json!({"poly": 1}))));
        world.restore(before);
        sync.resync(None);

        assert!(sync.on_draw_report(report(json!({"poly": 1}))));
        assert_eq!(
            world.read(|w| w.draw_info().cloned()),
            report(json!({"poly": 1}))
        );
    }

    #[test]
    fn test_structural_equality_ignores_key_order() {
        let world = WorldHandle::default();
        let sync = DrawSync::new(world.clone());

        sync.on_draw_report(report(json!({"lat": 1.0, "lon": 2.0})));
        let repeated = sync.on_draw_report(report(json!({"lon": 2.0, "lat": 1.0})));

        assert!(!repeated);
        assert_eq!(world.read(|w| w.draw_revision()), 1);
    }
}
