use chrono::{DateTime, Utc};
/// Formats recording-relative offsets as wall-clock timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeFormatter {
    /// Recording start, seconds since the UNIX epoch.
    pub absolute_start: f64,
    pub format: String,
}
impl TimeFormatter {
    pub fn new(absolute_start: f64, format: impl Into<String>) -> Self {
        Self {
            absolute_start,
            format: format.into(),
        }
    }
    pub fn format_offset(&self, offset_secs: f64) -> String {
        format_timestamp(self.absolute_start + offset_secs, &self.format)
    }
}
/// Renders `epoch_secs` in UTC. Values chrono cannot represent fall back to plain seconds.
pub fn format_timestamp(epoch_secs: f64, format: &str) -> String {
    match to_datetime(epoch_secs) {
        Some(dt) => dt.format(format).to_string(),
        None => format!("{epoch_secs:.3}s"),
    }
}
fn to_datetime(epoch_secs: f64) -> Option<DateTime<Utc>> {
    if !epoch_secs.is_finite() {
        return None;
    }
    let mut secs = epoch_secs.floor();
    let mut nanos = ((epoch_secs - secs) * 1e9).round();
    if nanos >= 1e9 {
        secs += 1.0;
        nanos = 0.0;
    }
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(secs as i64, nanos as u32)
}
