// src/lib.rs
pub mod actions;
pub mod channel_menu;
pub mod chart;
pub mod chunk;
pub mod config;
pub mod demo;
pub mod error;
pub mod export;
pub mod gating;
pub mod interval;
pub mod overlay;
pub mod pointer;
pub mod render_table;
pub mod stacking;
pub mod store;
pub mod timefmt;
pub mod transform;
pub use actions::{ActionSink, ChartAction};
pub use channel_menu::{ChannelMenu, RedrawHandle, SensitivityChange};
pub use chart::{ChartSurface, WaveformChart};
pub use chunk::{make_chunk, SignalChunk};
pub use config::{ChartConfig, PopupMetrics};
pub use error::ChartError;
pub use export::{render_snapshot_png, SnapshotStyle};
pub use gating::{UpdatePlan, VisibilityTracker};
pub use interval::{ClickPoint, IntervalSelector, IntervalState, PlotGeometry, ScreenPoint};
pub use overlay::OverlayShape;
pub use pointer::{channel_label_id, classify, point_id, PointerEvent, PointerTarget};
pub use render_table::{build_render_table, RenderRow, RenderTable};
pub use stacking::{StackingLayout, UniformStacking};
pub use store::{
    Annotation, ChangedFields, PredictionMode, RecordingType, Snapshot, SnapshotStore, StoreField,
    VisibleWindow, WaveEvent,
};
pub use timefmt::TimeFormatter;
pub use transform::{resolve, TransformContext, TransformationCache};
