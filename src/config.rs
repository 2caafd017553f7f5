use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::ChartError;
/// Pixel constants for the floating interval form and the channel menu.
///
/// These only tune presentation; the placement policy lives in `interval::place_form`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupMetrics {
    pub form_width: f32,
    pub form_height: f32,
    /// Gap between the click point and the form edge.
    pub margin: f32,
    /// How far above the click the channel menu is raised.
    pub menu_margin: f32,
}
impl Default for PopupMetrics {
    fn default() -> Self {
        Self {
            form_width: 260.0,
            form_height: 150.0,
            margin: 12.0,
            menu_margin: 40.0,
        }
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Marker written into the annotation column of an annotated row.
    pub annotation_token: String,
    pub unit_suffix: String,
    /// RGBA fill used for wave-event overlays.
    pub overlay_fill: [u8; 4],
    /// chrono format string for row timestamps.
    pub time_format: String,
    /// Multiplier applied by "increase"; "decrease" applies its reciprocal.
    pub sensitivity_step: f64,
    pub popup: PopupMetrics,
}
impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            annotation_token: "A".to_owned(),
            unit_suffix: "µV".to_owned(),
            // Amber at ~30% opacity.
            overlay_fill: [255, 193, 7, 77],
            time_format: "%H:%M:%S%.3f".to_owned(),
            sensitivity_step: 2.0,
            popup: PopupMetrics::default(),
        }
    }
}
impl ChartConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ChartError> {
        let config: ChartConfig = serde_json::from_str(raw)?;
        config.validated()
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChartError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }
    fn validated(self) -> Result<Self, ChartError> {
        if self.time_format.is_empty() {
            return Err(ChartError::Config("time_format must not be empty".into()));
        }
        if !(self.sensitivity_step > 0.0) {
            return Err(ChartError::Config(format!(
                "sensitivity_step must be positive, got {}",
                self.sensitivity_step
            )));
        }
        Ok(self)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn partial_json_keeps_defaults() {
        let config = ChartConfig::from_json_str(r#"{ "unit_suffix": "mV" }"#).unwrap();
        assert_eq!(config.unit_suffix, "mV");
        assert_eq!(config.annotation_token, "A");
        assert_eq!(config.popup, PopupMetrics::default());
    }
    #[test]
    fn rejects_non_positive_step() {
        let err = ChartConfig::from_json_str(r#"{ "sensitivity_step": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ChartError::Config(_)));
    }
}
