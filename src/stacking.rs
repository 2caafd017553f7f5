/// Maps a series index (0 = bottom of the plot) to its vertical baseline.
///
/// Implementations must be strictly increasing in `series_index` so stacked series
/// never swap places.
pub trait StackingLayout {
    fn render_offset(&self, series_index: usize) -> f64;
}
/// Every channel gets one slot of `series_height`; its baseline sits mid-slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformStacking {
    pub series_height: f64,
}
impl UniformStacking {
    pub fn new(series_height: f64) -> Self {
        Self {
            series_height: series_height.max(f64::EPSILON),
        }
    }
    /// Total plot height needed for `channel_count` slots.
    pub fn extent(&self, channel_count: usize) -> f64 {
        channel_count as f64 * self.series_height
    }
}
impl StackingLayout for UniformStacking {
    fn render_offset(&self, series_index: usize) -> f64 {
        (series_index as f64 + 0.5) * self.series_height
    }
}
/// Chunk channels are listed top-down; series indices count bottom-up.
pub fn series_index_for_channel(channel_position: usize, channel_count: usize) -> usize {
    channel_count - 1 - channel_position
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn offsets_strictly_increase() {
        let layout = UniformStacking::new(80.0);
        for i in 0..32 {
            assert!(layout.render_offset(i) < layout.render_offset(i + 1));
        }
        assert_eq!(layout.render_offset(0), 40.0);
        assert_eq!(layout.extent(4), 320.0);
    }
    #[test]
    fn non_positive_height_is_clamped() {
        let layout = UniformStacking::new(0.0);
        assert!(layout.render_offset(0) < layout.render_offset(1));
    }
    #[test]
    fn first_channel_is_top_series() {
        assert_eq!(series_index_for_channel(0, 4), 3);
        assert_eq!(series_index_for_channel(3, 4), 0);
    }
}
