//! Pure predicates deciding how much of the chart an upstream change invalidates.
use log::info;
use crate::store::{ChangedFields, Snapshot, StoreField};
use crate::transform::TransformationCache;
const REBUILD_FIELDS: &[StoreField] = &[
    StoreField::Annotations,
    StoreField::SignalChunk,
    StoreField::GlobalSensitivity,
];
const REDRAW_FIELDS: &[StoreField] = &[
    StoreField::ChunkStart,
    StoreField::TimeScale,
    StoreField::PredictionMode,
];
const OVERLAY_FIELDS: &[StoreField] = &[StoreField::WaveEvents];
/// Fields the chart subscribes to.
pub fn subscribed_fields() -> ChangedFields {
    REBUILD_FIELDS
        .iter()
        .chain(REDRAW_FIELDS)
        .chain(OVERLAY_FIELDS)
        .copied()
        .collect()
}
pub fn is_visible(snapshot: &Snapshot) -> bool {
    snapshot.chunk.is_some()
}
pub fn needs_data_rebuild(changed: &ChangedFields) -> bool {
    changed.contains_any(REBUILD_FIELDS)
}
/// The visible window moved or the prediction display changed.
pub fn needs_redraw(changed: &ChangedFields) -> bool {
    changed.contains_any(REDRAW_FIELDS)
}
pub fn needs_overlay_redraw(changed: &ChangedFields) -> bool {
    changed.contains_any(OVERLAY_FIELDS)
}
/// The three predicates evaluated together. Executed in field order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub rebuild: bool,
    pub redraw: bool,
    pub overlay: bool,
}
impl UpdatePlan {
    pub fn from_changes(changed: &ChangedFields) -> Self {
        Self {
            rebuild: needs_data_rebuild(changed),
            redraw: needs_redraw(changed),
            overlay: needs_overlay_redraw(changed),
        }
    }
    pub fn is_noop(&self) -> bool {
        !(self.rebuild || self.redraw || self.overlay)
    }
}
/// Remembers the last visibility so the transform cache is cleared exactly when the
/// chart goes from visible to hidden.
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    visible: bool,
}
impl VisibilityTracker {
    pub fn is_visible(&self) -> bool {
        self.visible
    }
    pub fn observe(&mut self, snapshot: &Snapshot, cache: &mut TransformationCache) -> bool {
        let now = is_visible(snapshot);
        if self.visible && !now {
            info!("chart hidden, clearing {} channel transforms", cache.len());
            cache.clear();
        }
        self.visible = now;
        now
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::make_chunk;
    use std::sync::Arc;
    fn fields(list: &[StoreField]) -> ChangedFields {
        list.iter().copied().collect()
    }
    #[test]
    fn predicates_are_independent() {
        let changed = fields(&[
            StoreField::SignalChunk,
            StoreField::TimeScale,
            StoreField::WaveEvents,
        ]);
        let plan = UpdatePlan::from_changes(&changed);
        assert_eq!(
            plan,
            UpdatePlan {
                rebuild: true,
                redraw: true,
                overlay: true
            }
        );
        assert!(UpdatePlan::from_changes(&fields(&[StoreField::ChannelHeight])).is_noop());
        assert!(needs_redraw(&fields(&[StoreField::PredictionMode])));
        assert!(!needs_data_rebuild(&fields(&[StoreField::PredictionMode])));
    }
    #[test]
    fn predicates_are_idempotent() {
        let changed = fields(&[StoreField::Annotations, StoreField::GlobalSensitivity]);
        let first = UpdatePlan::from_changes(&changed);
        let second = UpdatePlan::from_changes(&changed);
        assert_eq!(first, second);
        assert!(first.rebuild && !first.redraw && !first.overlay);
    }
    #[test]
    fn hiding_the_chart_clears_transforms() {
        let mut tracker = VisibilityTracker::default();
        let mut cache = TransformationCache::new();
        let mut snapshot = Snapshot::default();
        snapshot.load_chunk(Some(Arc::new(make_chunk(
            250.0,
            0.0,
            vec!["Fp1".into()],
            vec![vec![Some(1.0)]],
        ))));
        assert!(tracker.observe(&snapshot, &mut cache));
        cache.insert("Fp1", 3.0);
        assert!(tracker.observe(&snapshot, &mut cache));
        assert_eq!(cache.len(), 1);
        snapshot.load_chunk(None);
        assert!(!tracker.observe(&snapshot, &mut cache));
        assert!(cache.is_empty());
    }
    #[test]
    fn subscription_covers_all_predicates() {
        let subscribed = subscribed_fields();
        assert_eq!(subscribed.len(), 7);
        assert!(subscribed.contains(StoreField::WaveEvents));
        assert!(!subscribed.contains(StoreField::RecordingType));
    }
}
