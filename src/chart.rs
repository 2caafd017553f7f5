//! The chart core: owns the transform cache, both interaction state machines and the
//! current render table, and reacts to store notifications and pointer input.
use log::{debug, error, info};
use crate::actions::ActionSink;
use crate::channel_menu::{ChannelMenu, RedrawHandle, SensitivityChange};
use crate::config::ChartConfig;
use crate::error::ChartError;
use crate::export::{render_snapshot_png, SnapshotStyle};
use crate::gating::{self, UpdatePlan, VisibilityTracker};
use crate::interval::{ClickPoint, IntervalSelector, PlotGeometry};
use crate::overlay::{overlay_shapes, OverlayShape};
use crate::pointer::{classify, PointerEvent, PointerTarget};
use crate::render_table::{build_render_table, BuildContext, RenderTable};
use crate::stacking::UniformStacking;
use crate::store::{ChangedFields, PredictionMode, Snapshot, VisibleWindow};
use crate::timefmt::TimeFormatter;
use crate::transform::{TransformContext, TransformationCache};
/// Rendering collaborator. Calls arrive in rebuild -> content -> overlay order.
pub trait ChartSurface {
    fn redraw_content(&mut self, table: &RenderTable, window: VisibleWindow, prediction: PredictionMode);
    fn redraw_overlay(&mut self, shapes: &[OverlayShape]);
    /// The chart became hidden.
    fn clear(&mut self) {}
}
pub struct WaveformChart<A: ActionSink> {
    config: ChartConfig,
    sink: A,
    cache: TransformationCache,
    visibility: VisibilityTracker,
    interval: IntervalSelector,
    channel_menu: ChannelMenu,
    geometry: PlotGeometry,
    snapshot: Option<Snapshot>,
    table: Option<RenderTable>,
}
impl<A: ActionSink> WaveformChart<A> {
    pub fn new(config: ChartConfig, sink: A) -> Self {
        Self {
            config,
            sink,
            cache: TransformationCache::new(),
            visibility: VisibilityTracker::default(),
            interval: IntervalSelector::new(),
            channel_menu: ChannelMenu::new(),
            geometry: PlotGeometry {
                plot_left: 0.0,
                viewport_height: f32::MAX,
            },
            snapshot: None,
            table: None,
        }
    }
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }
    pub fn sink(&self) -> &A {
        &self.sink
    }
    pub fn sink_mut(&mut self) -> &mut A {
        &mut self.sink
    }
    pub fn cache(&self) -> &TransformationCache {
        &self.cache
    }
    pub fn table(&self) -> Option<&RenderTable> {
        self.table.as_ref()
    }
    pub fn interval(&self) -> &IntervalSelector {
        &self.interval
    }
    pub fn interval_mut(&mut self) -> &mut IntervalSelector {
        &mut self.interval
    }
    pub fn channel_menu(&self) -> &ChannelMenu {
        &self.channel_menu
    }
    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }
    /// Plot placement used for popup positioning; the UI updates it every frame.
    pub fn set_geometry(&mut self, geometry: PlotGeometry) {
        self.geometry = geometry;
    }
    fn formatter(&self, snapshot: &Snapshot) -> TimeFormatter {
        TimeFormatter::new(snapshot.absolute_start, self.config.time_format.clone())
    }
    /// Builds a fresh table from `snapshot`, resolving and caching channel transforms.
    /// A snapshot without a chunk yields an empty table.
    pub fn build_render_table(&mut self, snapshot: &Snapshot) -> Result<RenderTable, ChartError> {
        let Some(chunk) = snapshot.chunk.as_deref() else {
            return Ok(RenderTable::default());
        };
        let layout = UniformStacking::new(snapshot.channel_height);
        let ctx = BuildContext {
            transform: TransformContext::from_snapshot(snapshot),
            sample_rate_hz: snapshot.sample_rate_hz,
            formatter: self.formatter(snapshot),
            layout: &layout,
            config: &self.config,
            annotations: &snapshot.annotations,
        };
        build_render_table(chunk, &ctx, &mut self.cache)
    }
    pub fn compute_overlay_shapes(&self, snapshot: &Snapshot) -> Vec<OverlayShape> {
        overlay_shapes(
            snapshot.visible_window(),
            &snapshot.wave_events,
            self.config.overlay_fill,
        )
        .collect()
    }
    /// Store notification entry point. Returns the plan that was carried out.
    pub fn on_state_change(
        &mut self,
        snapshot: &Snapshot,
        changed: &ChangedFields,
        surface: &mut dyn ChartSurface,
    ) -> UpdatePlan {
        let was_visible = self.visibility.is_visible();
        let visible = self.visibility.observe(snapshot, &mut self.cache);
        let context_changed = self.snapshot.as_ref().is_some_and(|prev| {
            prev.global_sensitivity != snapshot.global_sensitivity
                || prev.recording_type != snapshot.recording_type
        });
        self.snapshot = Some(snapshot.clone());
        if !visible {
            if was_visible {
                self.table = None;
                self.interval.cancel();
                self.channel_menu.close();
                surface.clear();
            }
            return UpdatePlan::default();
        }
        if context_changed {
            let dropped = self.cache.invalidate_resolved();
            debug!("scale context changed, {dropped} channel transforms will re-resolve");
        }
        let mut plan = UpdatePlan::from_changes(changed);
        // First notification after becoming visible always needs data.
        if self.table.is_none() {
            plan.rebuild = true;
        }
        if plan.rebuild && !self.rebuild(snapshot) {
            // Nothing on screen may outlive the data it was built from.
            surface.clear();
            return plan;
        }
        let Some(table) = self.table.as_ref() else {
            return plan;
        };
        if plan.rebuild || plan.redraw {
            surface.redraw_content(table, snapshot.visible_window(), snapshot.prediction_mode);
        }
        // Overlays are positioned against the window, so a moved window repaints them too.
        if plan.overlay || plan.redraw || plan.rebuild {
            let shapes = self.compute_overlay_shapes(snapshot);
            surface.redraw_overlay(&shapes);
        }
        debug!("state change {:?} -> {:?}", changed, plan);
        plan
    }
    fn rebuild(&mut self, snapshot: &Snapshot) -> bool {
        match self.build_render_table(snapshot) {
            Ok(table) => {
                self.table = Some(table);
                true
            }
            Err(err) => {
                error!("render table build aborted: {err}");
                self.table = None;
                false
            }
        }
    }
    /// Routes a click to the interval gesture or the channel menu.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> PointerTarget {
        let target = classify(&event.element_id);
        match &target {
            PointerTarget::Point { row, .. } => {
                let (Some(table), Some(snapshot)) = (self.table.as_ref(), self.snapshot.as_ref())
                else {
                    return target;
                };
                let Some(time) = table.rows.get(*row).map(|r| r.time) else {
                    debug!("click on unknown row {row}");
                    return target;
                };
                let formatter = self.formatter(snapshot);
                self.interval.click(
                    ClickPoint {
                        time,
                        pos: event.pos,
                    },
                    &self.geometry,
                    &self.config.popup,
                    &formatter,
                );
            }
            PointerTarget::ChannelLabel(name) => {
                self.channel_menu
                    .click_label(name, event.pos, &self.geometry, &self.config.popup);
            }
            PointerTarget::Other => {}
        }
        target
    }
    pub fn confirm_interval(&mut self) -> bool {
        self.interval.confirm(&mut self.sink)
    }
    pub fn cancel_interval(&mut self) {
        self.interval.cancel();
    }
    pub fn close_channel_menu(&mut self) {
        self.channel_menu.close();
    }
    /// Rescales the channel whose menu is open, then reruns the full cycle on `surface`.
    pub fn adjust_sensitivity(
        &mut self,
        change: SensitivityChange,
        surface: Option<&mut dyn ChartSurface>,
    ) -> bool {
        let mut redraw_requested = false;
        let mut request = || redraw_requested = true;
        let handle: Option<&mut dyn RedrawHandle> = match surface {
            Some(_) => Some(&mut request),
            None => None,
        };
        let applied = self.channel_menu.adjust(
            change,
            self.config.sensitivity_step,
            &mut self.cache,
            handle,
        );
        if let (true, Some(surface)) = (redraw_requested, surface) {
            self.refresh(surface);
        }
        applied
    }
    /// Rebuild, redraw and repaint overlays from the last snapshot seen.
    pub fn refresh(&mut self, surface: &mut dyn ChartSurface) {
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };
        if gating::is_visible(&snapshot) {
            self.on_state_change(&snapshot, &ChangedFields::all(), surface);
        } else {
            self.snapshot = Some(snapshot);
        }
    }
    pub fn export_png(&self, style: &SnapshotStyle) -> Result<Vec<u8>, ChartError> {
        let (Some(table), Some(snapshot)) = (self.table.as_ref(), self.snapshot.as_ref()) else {
            return Err(ChartError::Plot("nothing loaded to export".into()));
        };
        let shapes = self.compute_overlay_shapes(snapshot);
        let bytes = render_snapshot_png(table, &shapes, snapshot.visible_window(), style)?;
        info!("exported {} byte snapshot", bytes.len());
        Ok(bytes)
    }
}
