//! Hit-test results arrive as element identifiers. Data points are named
//! `series:{series_index}:{row}` and channel labels `channel-label:{name}`.
use crate::interval::ScreenPoint;
const POINT_PREFIX: &str = "series:";
const LABEL_PREFIX: &str = "channel-label:";
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    Point { series_index: usize, row: usize },
    ChannelLabel(String),
    Other,
}
/// A click as reported by the rendering layer.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub element_id: String,
    pub pos: ScreenPoint,
}
pub fn point_id(series_index: usize, row: usize) -> String {
    format!("{POINT_PREFIX}{series_index}:{row}")
}
pub fn channel_label_id(channel: &str) -> String {
    format!("{LABEL_PREFIX}{channel}")
}
pub fn classify(element_id: &str) -> PointerTarget {
    if let Some(rest) = element_id.strip_prefix(POINT_PREFIX) {
        let parsed = rest
            .split_once(':')
            .and_then(|(s, r)| Some((s.parse::<usize>().ok()?, r.parse::<usize>().ok()?)));
        return match parsed {
            Some((series_index, row)) => PointerTarget::Point { series_index, row },
            None => PointerTarget::Other,
        };
    }
    match element_id.strip_prefix(LABEL_PREFIX) {
        Some(name) if !name.is_empty() => PointerTarget::ChannelLabel(name.to_owned()),
        _ => PointerTarget::Other,
    }
}
