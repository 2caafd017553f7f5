//! Read-only snapshot of the upstream state and a small in-memory store that diffs
//! snapshots into changed-field sets.
//!
//! The chart never mutates a [`Snapshot`]; it receives one together with the
//! [`ChangedFields`] of the update that produced it.
use std::collections::BTreeSet;
use std::sync::Arc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::actions::ChartAction;
use crate::chunk::SignalChunk;
/// Kind of recording currently loaded; selects the channel transform rule table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordingType {
    /// Clinical scalp EEG, possibly with ECG/EMG/EOG auxiliary channels.
    #[default]
    Eeg,
    /// Standalone 12-lead electrocardiogram.
    Ekg,
    /// Anything without a registered rule table.
    Other,
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionMode {
    #[default]
    Hidden,
    Overlay,
    Only,
}
/// Point-in-time label, `start_time` in recording seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub start_time: f64,
    pub label: String,
}
/// Interval annotation created by the interval-selection gesture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveEvent {
    pub start_time: f64,
    pub duration: f64,
    pub label: String,
}
impl WaveEvent {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}
/// Half-open `[start, end)` range of recording seconds currently on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleWindow {
    pub start: f64,
    pub end: f64,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StoreField {
    SignalChunk,
    SamplingFrequency,
    AbsoluteStart,
    ChunkStart,
    ChunkDuration,
    TimeScale,
    GlobalSensitivity,
    ChannelHeight,
    RecordingType,
    Annotations,
    WaveEvents,
    PredictionMode,
}
/// Set of fields touched by one store update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangedFields(BTreeSet<StoreField>);
impl ChangedFields {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn all() -> Self {
        [
            StoreField::SignalChunk,
            StoreField::SamplingFrequency,
            StoreField::AbsoluteStart,
            StoreField::ChunkStart,
            StoreField::ChunkDuration,
            StoreField::TimeScale,
            StoreField::GlobalSensitivity,
            StoreField::ChannelHeight,
            StoreField::RecordingType,
            StoreField::Annotations,
            StoreField::WaveEvents,
            StoreField::PredictionMode,
        ]
        .into_iter()
        .collect()
    }
    pub fn insert(&mut self, field: StoreField) {
        self.0.insert(field);
    }
    pub fn contains(&self, field: StoreField) -> bool {
        self.0.contains(&field)
    }
    pub fn contains_any(&self, fields: &[StoreField]) -> bool {
        fields.iter().any(|f| self.0.contains(f))
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn intersection(&self, other: &ChangedFields) -> ChangedFields {
        ChangedFields(self.0.intersection(&other.0).copied().collect())
    }
    pub fn iter(&self) -> impl Iterator<Item = StoreField> + '_ {
        self.0.iter().copied()
    }
}
impl FromIterator<StoreField> for ChangedFields {
    fn from_iter<T: IntoIterator<Item = StoreField>>(iter: T) -> Self {
        ChangedFields(iter.into_iter().collect())
    }
}
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub chunk: Option<Arc<SignalChunk>>,
    pub sample_rate_hz: f64,
    /// Wall-clock start of the recording, seconds since the UNIX epoch.
    pub absolute_start: f64,
    pub chunk_start: f64,
    pub chunk_duration: f64,
    /// Seconds of signal shown across the plot width.
    pub time_scale: f64,
    /// Microvolts per plot unit.
    pub global_sensitivity: f64,
    pub channel_height: f64,
    pub recording_type: RecordingType,
    pub annotations: Vec<Annotation>,
    pub wave_events: Vec<WaveEvent>,
    pub prediction_mode: PredictionMode,
}
impl Default for Snapshot {
    fn default() -> Self {
        Self {
            chunk: None,
            sample_rate_hz: 250.0,
            absolute_start: 0.0,
            chunk_start: 0.0,
            chunk_duration: 0.0,
            time_scale: 10.0,
            // 7 µV/mm is the usual clinical EEG default.
            global_sensitivity: 7.0,
            channel_height: 100.0,
            recording_type: RecordingType::Eeg,
            annotations: Vec::new(),
            wave_events: Vec::new(),
            prediction_mode: PredictionMode::Hidden,
        }
    }
}
impl Snapshot {
    pub fn visible_window(&self) -> VisibleWindow {
        VisibleWindow {
            start: self.chunk_start,
            end: self.chunk_start + self.time_scale,
        }
    }
    /// Field-by-field comparison. The chunk compares by identity, not content.
    pub fn diff(&self, newer: &Snapshot) -> ChangedFields {
        let mut changed = ChangedFields::new();
        let same_chunk = match (&self.chunk, &newer.chunk) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same_chunk {
            changed.insert(StoreField::SignalChunk);
        }
        if self.sample_rate_hz != newer.sample_rate_hz {
            changed.insert(StoreField::SamplingFrequency);
        }
        if self.absolute_start != newer.absolute_start {
            changed.insert(StoreField::AbsoluteStart);
        }
        if self.chunk_start != newer.chunk_start {
            changed.insert(StoreField::ChunkStart);
        }
        if self.chunk_duration != newer.chunk_duration {
            changed.insert(StoreField::ChunkDuration);
        }
        if self.time_scale != newer.time_scale {
            changed.insert(StoreField::TimeScale);
        }
        if self.global_sensitivity != newer.global_sensitivity {
            changed.insert(StoreField::GlobalSensitivity);
        }
        if self.channel_height != newer.channel_height {
            changed.insert(StoreField::ChannelHeight);
        }
        if self.recording_type != newer.recording_type {
            changed.insert(StoreField::RecordingType);
        }
        if self.annotations != newer.annotations {
            changed.insert(StoreField::Annotations);
        }
        if self.wave_events != newer.wave_events {
            changed.insert(StoreField::WaveEvents);
        }
        if self.prediction_mode != newer.prediction_mode {
            changed.insert(StoreField::PredictionMode);
        }
        changed
    }
    /// Reducer for actions coming back from the dispatch bus.
    pub fn apply(&mut self, action: &ChartAction) {
        match action {
            ChartAction::CreateWaveEvent {
                label_text,
                start_time,
                duration,
            } => {
                self.wave_events.push(WaveEvent {
                    start_time: *start_time,
                    duration: *duration,
                    label: label_text.clone(),
                });
            }
        }
    }
    /// Replaces the loaded chunk and keeps the chunk-derived fields in step with it.
    pub fn load_chunk(&mut self, chunk: Option<Arc<SignalChunk>>) {
        if let Some(chunk) = &chunk {
            self.sample_rate_hz = chunk.sample_rate_hz;
            self.chunk_start = chunk.start_time;
            self.chunk_duration = chunk.duration;
        }
        self.chunk = chunk;
    }
}
pub type SubscriptionId = usize;
type Listener = Box<dyn FnMut(&Snapshot, &ChangedFields)>;
struct Subscriber {
    id: SubscriptionId,
    fields: ChangedFields,
    listener: Listener,
}
/// Single-threaded store: updates are applied and delivered to completion in order.
pub struct SnapshotStore {
    snapshot: Snapshot,
    subscribers: Vec<Subscriber>,
    next_id: SubscriptionId,
}
impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
    /// Registers `listener` for the given fields. It only fires when at least one of
    /// them changed, and only sees that subset.
    pub fn subscribe(
        &mut self,
        fields: ChangedFields,
        listener: impl FnMut(&Snapshot, &ChangedFields) + 'static,
    ) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            fields,
            listener: Box::new(listener),
        });
        id
    }
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|s| s.id != id);
    }
    pub fn update(&mut self, mutate: impl FnOnce(&mut Snapshot)) -> ChangedFields {
        let mut next = self.snapshot.clone();
        mutate(&mut next);
        let changed = self.snapshot.diff(&next);
        self.snapshot = next;
        if changed.is_empty() {
            return changed;
        }
        debug!("store update changed {:?}", changed);
        for subscriber in &mut self.subscribers {
            let relevant = changed.intersection(&subscriber.fields);
            if !relevant.is_empty() {
                (subscriber.listener)(&self.snapshot, &relevant);
            }
        }
        changed
    }
    pub fn dispatch(&mut self, action: &ChartAction) -> ChangedFields {
        info!("store received {:?}", action);
        self.update(|s| s.apply(action))
    }
}
