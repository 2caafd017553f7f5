//! Two-click interval selection that ends in a "create wave event" action.
//!
//! The gesture is a three-state machine. [`on_point_click`] and [`confirm_action`] are
//! pure; [`IntervalSelector`] pairs them with the floating form the user types the
//! label into.
use log::{debug, info};
use crate::actions::{ActionSink, ChartAction};
use crate::config::PopupMetrics;
use crate::timefmt::TimeFormatter;
/// Position in screen pixels, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}
impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
/// Where the plot sits inside the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotGeometry {
    pub plot_left: f32,
    pub viewport_height: f32,
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickPoint {
    /// Recording seconds of the clicked sample.
    pub time: f64,
    pub pos: ScreenPoint,
}
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum IntervalState {
    #[default]
    Empty,
    FirstClickRecorded(ClickPoint),
    BothClicksRecorded(ClickPoint, ClickPoint),
}
impl IntervalState {
    pub fn first(&self) -> Option<&ClickPoint> {
        match self {
            IntervalState::Empty => None,
            IntervalState::FirstClickRecorded(first) | IntervalState::BothClicksRecorded(first, _) => {
                Some(first)
            }
        }
    }
    pub fn second(&self) -> Option<&ClickPoint> {
        match self {
            IntervalState::BothClicksRecorded(_, second) => Some(second),
            _ => None,
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickRole {
    First,
    Second,
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickTransition {
    pub state: IntervalState,
    pub role: ClickRole,
    /// The previous gesture was abandoned before this click was recorded.
    pub reset: bool,
}
pub fn on_point_click(state: IntervalState, click: ClickPoint) -> ClickTransition {
    let stale = match state {
        IntervalState::Empty => false,
        IntervalState::FirstClickRecorded(first) => click.time < first.time,
        IntervalState::BothClicksRecorded(..) => true,
    };
    let state = if stale { IntervalState::Empty } else { state };
    match state {
        IntervalState::FirstClickRecorded(first) => ClickTransition {
            state: IntervalState::BothClicksRecorded(first, click),
            role: ClickRole::Second,
            reset: false,
        },
        _ => ClickTransition {
            state: IntervalState::FirstClickRecorded(click),
            role: ClickRole::First,
            reset: stale,
        },
    }
}
/// Action a confirm would emit, or `None` for the guarded no-ops.
pub fn confirm_action(state: &IntervalState, label: &str) -> Option<ChartAction> {
    let start = state.first()?.time;
    let end = state.second().map(|c| c.time).unwrap_or(start);
    if end < start {
        return None;
    }
    Some(ChartAction::CreateWaveEvent {
        label_text: label.to_owned(),
        start_time: start,
        duration: end - start,
    })
}
/// Top-left corner for the interval form.
///
/// Prefers the left of the click when that clears the plot's left edge, otherwise
/// below-right; flips above the click when it would run off the viewport bottom.
pub fn place_form(click: ScreenPoint, geometry: &PlotGeometry, metrics: &PopupMetrics) -> ScreenPoint {
    let left_x = click.x - metrics.form_width - metrics.margin;
    let x = if left_x >= geometry.plot_left {
        left_x
    } else {
        click.x + metrics.margin
    };
    let mut y = click.y + metrics.margin;
    if y + metrics.form_height > geometry.viewport_height {
        y = click.y - metrics.form_height - metrics.margin;
    }
    ScreenPoint::new(x, y)
}
/// What the UI layer shows for the in-progress gesture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntervalForm {
    pub visible: bool,
    pub position: ScreenPoint,
    pub start_text: String,
    pub end_text: String,
    pub label: String,
}
#[derive(Debug, Default)]
pub struct IntervalSelector {
    state: IntervalState,
    form: IntervalForm,
}
impl IntervalSelector {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn state(&self) -> &IntervalState {
        &self.state
    }
    pub fn form(&self) -> &IntervalForm {
        &self.form
    }
    pub fn form_mut(&mut self) -> &mut IntervalForm {
        &mut self.form
    }
    /// Highlighted range on the chart, if any.
    pub fn selection(&self) -> Option<(f64, f64)> {
        let first = self.state.first()?.time;
        let end = self.state.second().map(|c| c.time).unwrap_or(first);
        Some((first, end))
    }
    pub fn click(
        &mut self,
        click: ClickPoint,
        geometry: &PlotGeometry,
        metrics: &PopupMetrics,
        formatter: &TimeFormatter,
    ) -> ClickRole {
        let transition = on_point_click(self.state, click);
        if transition.reset {
            debug!("interval gesture reset by click at {}", click.time);
        }
        match transition.role {
            ClickRole::First => {
                self.form.start_text = formatter.format_offset(click.time);
                self.form.end_text.clear();
                self.form.position = place_form(click.pos, geometry, metrics);
                self.form.visible = true;
            }
            ClickRole::Second => {
                self.form.end_text = formatter.format_offset(click.time);
            }
        }
        self.state = transition.state;
        debug!("interval state -> {:?}", self.state);
        transition.role
    }
    pub fn cancel(&mut self) {
        self.state = IntervalState::Empty;
        self.form.start_text.clear();
        self.form.end_text.clear();
        self.form.visible = false;
    }
    /// Emits the wave event and resets. Returns `false` when nothing was emitted.
    pub fn confirm(&mut self, sink: &mut dyn ActionSink) -> bool {
        let Some(action) = confirm_action(&self.state, &self.form.label) else {
            debug!("interval confirm ignored in {:?}", self.state);
            return false;
        };
        info!("emitting {:?}", action);
        sink.dispatch(action);
        self.cancel();
        true
    }
}
