use log::debug;
use crate::config::PopupMetrics;
use crate::interval::{PlotGeometry, ScreenPoint};
use crate::transform::TransformationCache;
/// Whoever can rerun the full rebuild + redraw cycle.
pub trait RedrawHandle {
    fn request_full_redraw(&mut self);
}
impl<F: FnMut()> RedrawHandle for F {
    fn request_full_redraw(&mut self) {
        self()
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensitivityChange {
    Increase,
    Decrease,
    /// Drop the override so the next build resolves the channel from its rules again.
    Reset,
}
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelMenu {
    selected: Option<String>,
    position: ScreenPoint,
    title: String,
}
impl ChannelMenu {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }
    pub fn position(&self) -> ScreenPoint {
        self.position
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    /// Toggles the menu for `channel`. Returns whether a menu is open afterwards.
    pub fn click_label(
        &mut self,
        channel: &str,
        click: ScreenPoint,
        geometry: &PlotGeometry,
        metrics: &PopupMetrics,
    ) -> bool {
        if self.selected.as_deref() == Some(channel) {
            self.close();
            return false;
        }
        self.selected = Some(channel.to_owned());
        self.position = ScreenPoint::new(geometry.plot_left, click.y - metrics.menu_margin);
        self.title = channel.to_owned();
        debug!("channel menu opened for {channel}");
        true
    }
    pub fn close(&mut self) {
        self.selected = None;
        self.title.clear();
    }
    /// Rescales the selected channel and triggers a redraw.
    ///
    /// Without a selected channel, a redraw handle, or a resolved transform for the
    /// channel this does nothing and returns `false`.
    pub fn adjust(
        &mut self,
        change: SensitivityChange,
        step: f64,
        cache: &mut TransformationCache,
        redraw: Option<&mut dyn RedrawHandle>,
    ) -> bool {
        let (Some(channel), Some(redraw)) = (self.selected.as_deref(), redraw) else {
            debug!("sensitivity {change:?} ignored: no channel or redraw handle");
            return false;
        };
        let applied = match change {
            SensitivityChange::Increase => cache.scale(channel, step).is_some(),
            SensitivityChange::Decrease => cache.scale(channel, 1.0 / step).is_some(),
            SensitivityChange::Reset => cache.remove(channel).is_some(),
        };
        if !applied {
            debug!("sensitivity {change:?} ignored: {channel} has no transform yet");
            return false;
        }
        debug!("sensitivity {change:?} applied to {channel}");
        redraw.request_full_redraw();
        true
    }
}
