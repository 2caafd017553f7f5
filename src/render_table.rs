//! Display-ready staging table built once per chunk.
//!
//! Column layout is fixed:
//! `[time, annotation, annotation_html, channel_1, tooltip_1, channel_2, tooltip_2, ...]`
//! so the table always has `3 + 2 * channel_count` columns. Channels keep the chunk's
//! top-down order; series indices used by the plot count bottom-up.
use std::collections::HashMap;
use log::debug;
use crate::chunk::SignalChunk;
use crate::config::ChartConfig;
use crate::error::ChartError;
use crate::stacking::{series_index_for_channel, StackingLayout};
use crate::store::Annotation;
use crate::timefmt::TimeFormatter;
use crate::transform::{resolve, TransformContext, TransformationCache};
/// Number of leading non-channel columns.
pub const FIXED_COLUMNS: usize = 3;
/// Plot value and the original amplitude it was derived from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelCell {
    /// Original signal amplitude; tooltips show this.
    pub display: f64,
    /// `display * transform + offset`; the plot draws this.
    pub render: f64,
}
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRow {
    pub time: f64,
    pub time_text: String,
    pub annotation_label: Option<String>,
    pub annotation_html: Option<String>,
    pub cells: Vec<Option<ChannelCell>>,
    pub tooltips: Vec<Option<String>>,
}
/// Borrowed view of one table cell addressed by column index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TableCell<'a> {
    Time { raw: f64, text: &'a str },
    AnnotationLabel(Option<&'a str>),
    AnnotationHtml(Option<&'a str>),
    Channel(Option<ChannelCell>),
    Tooltip(Option<&'a str>),
}
/// How a caller numbers series when asking for their column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesOrder {
    BottomUp,
    TopDown,
}
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderTable {
    pub channel_labels: Vec<String>,
    pub rows: Vec<RenderRow>,
}
impl RenderTable {
    pub fn channel_count(&self) -> usize {
        self.channel_labels.len()
    }
    pub fn column_count(&self) -> usize {
        FIXED_COLUMNS + 2 * self.channel_count()
    }
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
    pub fn column_index_for_series(&self, series_index: usize, order: SeriesOrder) -> Option<usize> {
        let n = self.channel_count();
        if series_index >= n {
            return None;
        }
        let position = match order {
            SeriesOrder::BottomUp => n - 1 - series_index,
            SeriesOrder::TopDown => series_index,
        };
        Some(FIXED_COLUMNS + 2 * position)
    }
    pub fn cell(&self, row: usize, column: usize) -> Option<TableCell<'_>> {
        let row = self.rows.get(row)?;
        match column {
            0 => Some(TableCell::Time {
                raw: row.time,
                text: &row.time_text,
            }),
            1 => Some(TableCell::AnnotationLabel(row.annotation_label.as_deref())),
            2 => Some(TableCell::AnnotationHtml(row.annotation_html.as_deref())),
            c if c < self.column_count() => {
                let channel = (c - FIXED_COLUMNS) / 2;
                if (c - FIXED_COLUMNS) % 2 == 0 {
                    Some(TableCell::Channel(row.cells[channel]))
                } else {
                    Some(TableCell::Tooltip(row.tooltips[channel].as_deref()))
                }
            }
            _ => None,
        }
    }
    /// Label of the series at `series_index` (0 = bottom).
    pub fn series_label(&self, series_index: usize) -> Option<&str> {
        let n = self.channel_count();
        (series_index < n).then(|| self.channel_labels[n - 1 - series_index].as_str())
    }
    /// `(time, render value)` pairs for one series, skipping empty cells.
    pub fn series_points(&self, series_index: usize) -> Vec<[f64; 2]> {
        let n = self.channel_count();
        if series_index >= n {
            return Vec::new();
        }
        let position = n - 1 - series_index;
        self.rows
            .iter()
            .filter_map(|row| row.cells[position].map(|cell| [row.time, cell.render]))
            .collect()
    }
    pub fn tooltip(&self, series_index: usize, row: usize) -> Option<&str> {
        let n = self.channel_count();
        if series_index >= n {
            return None;
        }
        self.rows.get(row)?.tooltips[n - 1 - series_index].as_deref()
    }
    pub fn display_value(&self, series_index: usize, row: usize) -> Option<f64> {
        let n = self.channel_count();
        if series_index >= n {
            return None;
        }
        self.rows.get(row)?.cells[n - 1 - series_index].map(|c| c.display)
    }
    /// Row whose time is closest to `time`. Rows are in ascending time order.
    pub fn nearest_row(&self, time: f64) -> Option<usize> {
        if self.rows.is_empty() || !time.is_finite() {
            return None;
        }
        let idx = self.rows.partition_point(|r| r.time < time);
        if idx == 0 {
            return Some(0);
        }
        if idx == self.rows.len() {
            return Some(idx - 1);
        }
        let before = time - self.rows[idx - 1].time;
        let after = self.rows[idx].time - time;
        Some(if before <= after { idx - 1 } else { idx })
    }
    pub fn annotated_rows(&self) -> impl Iterator<Item = (usize, &RenderRow)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.annotation_label.is_some())
    }
}
/// Everything besides the chunk that the builder reads.
pub struct BuildContext<'a> {
    pub transform: TransformContext,
    pub sample_rate_hz: f64,
    pub formatter: TimeFormatter,
    pub layout: &'a dyn StackingLayout,
    pub config: &'a ChartConfig,
    pub annotations: &'a [Annotation],
}
/// Index of the sampling-grid point nearest to `time`.
pub fn grid_index(time: f64, sample_rate_hz: f64) -> i64 {
    (time * sample_rate_hz).round() as i64
}
/// `round(time * fs) / fs`
pub fn snap_to_grid(time: f64, sample_rate_hz: f64) -> f64 {
    grid_index(time, sample_rate_hz) as f64 / sample_rate_hz
}
pub fn build_render_table(
    chunk: &SignalChunk,
    ctx: &BuildContext<'_>,
    cache: &mut TransformationCache,
) -> Result<RenderTable, ChartError> {
    chunk.validate()?;
    if !(ctx.sample_rate_hz > 0.0) {
        return Err(ChartError::InvalidSampleRate);
    }
    let channel_count = chunk.num_channels();
    // 1. Owned copy of the time column; nothing below borrows from the store.
    let mut rows: Vec<RenderRow> = chunk
        .times
        .iter()
        .map(|&time| RenderRow {
            time,
            time_text: String::new(),
            annotation_label: None,
            annotation_html: None,
            cells: vec![None; channel_count],
            tooltips: vec![None; channel_count],
        })
        .collect();
    // 2. Scale and stack every non-null cell.
    for (position, (label, column)) in chunk
        .channel_labels
        .iter()
        .zip(&chunk.samples)
        .enumerate()
    {
        let offset = ctx
            .layout
            .render_offset(series_index_for_channel(position, channel_count));
        let mut transform = None;
        for (row, sample) in rows.iter_mut().zip(column) {
            let Some(display) = *sample else {
                continue;
            };
            let factor = match transform {
                Some(f) => f,
                None => {
                    let f = resolve(cache, label, &ctx.transform)?;
                    transform = Some(f);
                    f
                }
            };
            row.cells[position] = Some(ChannelCell {
                display,
                render: display * factor + offset,
            });
        }
    }
    // 3. Absolute timestamps.
    for row in &mut rows {
        row.time_text = ctx.formatter.format_offset(row.time);
    }
    // 4. Point annotations.
    attach_annotations(&mut rows, ctx);
    // 5. Tooltips.
    let escaped_labels: Vec<String> = chunk.channel_labels.iter().map(|l| escape_html(l)).collect();
    for row in &mut rows {
        for (position, cell) in row.cells.iter().enumerate() {
            if let Some(cell) = cell {
                row.tooltips[position] = Some(tooltip_html(
                    &row.time_text,
                    &escaped_labels[position],
                    cell.display,
                    &ctx.config.unit_suffix,
                ));
            }
        }
    }
    debug!(
        "built render table: {} rows x {} columns",
        rows.len(),
        FIXED_COLUMNS + 2 * channel_count
    );
    Ok(RenderTable {
        channel_labels: chunk.channel_labels.clone(),
        rows,
    })
}
fn attach_annotations(rows: &mut [RenderRow], ctx: &BuildContext<'_>) {
    if ctx.annotations.is_empty() {
        return;
    }
    let by_grid: HashMap<i64, usize> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| (grid_index(row.time, ctx.sample_rate_hz), idx))
        .collect();
    for annotation in ctx.annotations {
        let key = grid_index(annotation.start_time, ctx.sample_rate_hz);
        let Some(&idx) = by_grid.get(&key) else {
            debug!(
                "annotation '{}' at {} is outside the chunk",
                annotation.label, annotation.start_time
            );
            continue;
        };
        let row = &mut rows[idx];
        let body = escape_html(&annotation.label);
        row.annotation_label = Some(ctx.config.annotation_token.clone());
        row.annotation_html = Some(match row.annotation_html.take() {
            // Several labels on one sample stack inside the same body.
            Some(existing) => existing.replacen("</div>", &format!("<br/>{body}</div>"), 1),
            None => format!("<div class=\"annotation\">{body}</div>"),
        });
    }
}
fn tooltip_html(time_text: &str, channel: &str, value: f64, unit: &str) -> String {
    format!(
        "<div class=\"tooltip\"><span class=\"time\">{time_text}</span><br/><b>{channel}</b>: {value:.2} {unit}</div>"
    )
}
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::make_chunk;
    use crate::stacking::UniformStacking;
    use crate::store::RecordingType;
    fn context<'a>(
        layout: &'a UniformStacking,
        config: &'a ChartConfig,
        annotations: &'a [Annotation],
        sensitivity: f64,
    ) -> BuildContext<'a> {
        BuildContext {
            transform: TransformContext {
                recording_type: RecordingType::Eeg,
                global_sensitivity: sensitivity,
                channel_height: 100.0,
            },
            sample_rate_hz: 250.0,
            formatter: TimeFormatter::new(0.0, "%H:%M:%S%.3f"),
            layout,
            config,
            annotations,
        }
    }
    fn two_channel_chunk() -> SignalChunk {
        make_chunk(
            250.0,
            0.0,
            vec!["Fp1".into(), "O2".into()],
            vec![
                vec![Some(10.0), None, Some(-4.0)],
                vec![Some(1.0), Some(2.0), Some(3.0)],
            ],
        )
    }
    #[test]
    fn layout_has_three_plus_two_per_channel_columns() {
        let layout = UniformStacking::new(100.0);
        let config = ChartConfig::default();
        let mut cache = TransformationCache::new();
        let table = build_render_table(
            &two_channel_chunk(),
            &context(&layout, &config, &[], 2.0),
            &mut cache,
        )
        .unwrap();
        assert_eq!(table.column_count(), 7);
        // Series 0 is the bottom channel (O2), which is the last chunk column.
        assert_eq!(table.column_index_for_series(0, SeriesOrder::BottomUp), Some(5));
        assert_eq!(table.column_index_for_series(0, SeriesOrder::TopDown), Some(3));
        assert_eq!(table.column_index_for_series(2, SeriesOrder::TopDown), None);
        assert_eq!(table.series_label(0), Some("O2"));
        assert!(matches!(table.cell(0, 4), Some(TableCell::Tooltip(Some(_)))));
        assert!(table.cell(0, 7).is_none());
    }
    #[test]
    fn render_value_is_scaled_and_offset_display_value_kept() {
        let layout = UniformStacking::new(100.0);
        let config = ChartConfig::default();
        let mut cache = TransformationCache::new();
        let table = build_render_table(
            &two_channel_chunk(),
            &context(&layout, &config, &[], 2.0),
            &mut cache,
        )
        .unwrap();
        // Fp1 is top series (index 1): offset 150, factor 0.5.
        let cell = table.rows[0].cells[0].unwrap();
        assert_eq!(cell.display, 10.0);
        assert_eq!(cell.render, 10.0 * 0.5 + 150.0);
        assert!(table.rows[1].cells[0].is_none());
        assert!(table.rows[1].tooltips[0].is_none());
        let tip = table.tooltip(1, 2).unwrap();
        assert!(tip.contains("-4.00 µV"));
        assert!(tip.contains("<b>Fp1</b>"));
        assert_eq!(table.display_value(0, 1), Some(2.0));
    }
    #[test]
    fn timestamps_are_absolute() {
        let layout = UniformStacking::new(100.0);
        let config = ChartConfig::default();
        let mut cache = TransformationCache::new();
        let mut ctx = context(&layout, &config, &[], 2.0);
        ctx.formatter = TimeFormatter::new(3600.0, "%H:%M:%S%.3f");
        let table = build_render_table(&two_channel_chunk(), &ctx, &mut cache).unwrap();
        assert_eq!(table.rows[2].time_text, "01:00:00.008");
    }
    #[test]
    fn annotation_snaps_to_sampling_grid() {
        let samples = vec![vec![Some(0.0); 500]];
        let chunk = make_chunk(250.0, 0.0, vec!["Cz".into()], samples);
        let annotations = vec![
            Annotation {
                start_time: 1.001,
                label: "eyes <closed>".into(),
            },
            Annotation {
                start_time: 1.0015,
                label: "blink".into(),
            },
            Annotation {
                start_time: 1.003,
                label: "spike".into(),
            },
            Annotation {
                start_time: 9.0,
                label: "outside".into(),
            },
        ];
        let layout = UniformStacking::new(100.0);
        let config = ChartConfig::default();
        let mut cache = TransformationCache::new();
        let table =
            build_render_table(&chunk, &context(&layout, &config, &annotations, 1.0), &mut cache)
                .unwrap();
        assert_eq!(snap_to_grid(1.001, 250.0), 1.0);
        let row = &table.rows[250];
        assert_eq!(row.time, 1.0);
        assert_eq!(row.annotation_label.as_deref(), Some("A"));
        assert_eq!(
            row.annotation_html.as_deref(),
            Some("<div class=\"annotation\">eyes &lt;closed&gt;<br/>blink</div>")
        );
        // 1.003 * 250 = 250.75 rounds to sample 251, so this label lands on the
        // 1.004 s row and not on the 1.000 s row with the other two.
        assert_eq!(snap_to_grid(1.003, 250.0), 1.004);
        assert_eq!(
            table.rows[251].annotation_html.as_deref(),
            Some("<div class=\"annotation\">spike</div>")
        );
        assert_eq!(table.annotated_rows().count(), 2);
    }
    #[test]
    fn zero_sensitivity_aborts_build() {
        let layout = UniformStacking::new(100.0);
        let config = ChartConfig::default();
        let mut cache = TransformationCache::new();
        let err = build_render_table(
            &two_channel_chunk(),
            &context(&layout, &config, &[], 0.0),
            &mut cache,
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::ZeroSensitivity));
    }
    #[test]
    fn malformed_chunk_is_rejected() {
        let mut chunk = two_channel_chunk();
        chunk.samples[0].push(Some(1.0));
        let layout = UniformStacking::new(100.0);
        let config = ChartConfig::default();
        let mut cache = TransformationCache::new();
        let err =
            build_render_table(&chunk, &context(&layout, &config, &[], 1.0), &mut cache).unwrap_err();
        assert!(matches!(err, ChartError::RowMismatch { column: 1, .. }));
    }
    #[test]
    fn cached_override_survives_rebuild() {
        let layout = UniformStacking::new(100.0);
        let config = ChartConfig::default();
        let mut cache = TransformationCache::new();
        cache.insert("O2", 4.0);
        let table = build_render_table(
            &two_channel_chunk(),
            &context(&layout, &config, &[], 2.0),
            &mut cache,
        )
        .unwrap();
        assert_eq!(table.rows[0].cells[1].unwrap().render, 1.0 * 4.0 + 50.0);
        assert_eq!(cache.get("Fp1"), Some(0.5));
    }
    #[test]
    fn nearest_row_picks_closest_sample() {
        let layout = UniformStacking::new(100.0);
        let config = ChartConfig::default();
        let mut cache = TransformationCache::new();
        let table = build_render_table(
            &two_channel_chunk(),
            &context(&layout, &config, &[], 1.0),
            &mut cache,
        )
        .unwrap();
        assert_eq!(table.nearest_row(-1.0), Some(0));
        assert_eq!(table.nearest_row(0.0055), Some(1));
        assert_eq!(table.nearest_row(0.0065), Some(2));
        assert_eq!(table.nearest_row(5.0), Some(2));
    }
}
