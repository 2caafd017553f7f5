use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use crate::error::ChartError;
use crate::overlay::OverlayShape;
use crate::render_table::RenderTable;
use crate::store::VisibleWindow;
#[derive(Clone, Debug)]
pub struct SnapshotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    pub annotation_color: RGBColor,
    /// Axis labels and the series legend; these need a system font.
    pub show_labels: bool,
}
impl Default for SnapshotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
            background: RGBColor(10, 10, 10),
            palette: vec![BLUE, RED, GREEN, CYAN, MAGENTA, YELLOW, WHITE],
            annotation_color: RGBColor(255, 152, 0),
            show_labels: true,
        }
    }
}
/// Contiguous runs of non-empty cells inside `window` for one series.
fn series_segments(table: &RenderTable, series_index: usize, window: VisibleWindow) -> Vec<Vec<(f64, f64)>> {
    let n = table.channel_count();
    if series_index >= n {
        return Vec::new();
    }
    let position = n - 1 - series_index;
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for row in table
        .rows
        .iter()
        .filter(|r| r.time >= window.start && r.time < window.end)
    {
        match row.cells[position] {
            Some(cell) => current.push((row.time, cell.render)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}
/// Renders the visible part of `table` with its wave-event overlays and annotation
/// markers to a PNG.
pub fn render_snapshot_png(
    table: &RenderTable,
    overlays: &[OverlayShape],
    window: VisibleWindow,
    style: &SnapshotStyle,
) -> Result<Vec<u8>, ChartError> {
    if table.rows.is_empty() {
        return Err(ChartError::Plot("render table has no rows".into()));
    }
    if style.palette.is_empty() {
        return Err(ChartError::Plot("palette is empty".into()));
    }
    let (y_min, y_max) = table
        .rows
        .iter()
        .flat_map(|r| r.cells.iter().flatten().map(|c| c.render))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let (y_min, y_max) = if y_min.is_finite() && y_max - y_min > f64::EPSILON {
        let pad = (y_max - y_min) * 0.05;
        (y_min - pad, y_max + pad)
    } else {
        (-50.0, 50.0)
    };
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(window.start..window.end, y_min..y_max)?;
        let mut mesh = chart.configure_mesh();
        mesh.disable_y_mesh().light_line_style(&WHITE.mix(0.1));
        if !style.show_labels {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw()?;
        chart.draw_series(overlays.iter().map(|shape| {
            let [r, g, b, a] = shape.fill;
            Rectangle::new(
                [(shape.start, y_min), (shape.end, y_max)],
                RGBAColor(r, g, b, a as f64 / 255.0).filled(),
            )
        }))?;
        let annotation_color = style.annotation_color;
        chart.draw_series(
            table
                .annotated_rows()
                .filter(|(_, r)| r.time >= window.start && r.time < window.end)
                .map(|(_, r)| {
                    PathElement::new(vec![(r.time, y_min), (r.time, y_max)], &annotation_color)
                }),
        )?;
        for series_index in 0..table.channel_count() {
            let color = style.palette[series_index % style.palette.len()];
            let label = table.series_label(series_index).unwrap_or_default().to_owned();
            for (i, segment) in series_segments(table, series_index, window)
                .into_iter()
                .enumerate()
            {
                let drawn = chart.draw_series(LineSeries::new(segment, &color))?;
                if i == 0 && style.show_labels {
                    drawn
                        .label(label.clone())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
                }
            }
        }
        if style.show_labels {
            chart
                .configure_series_labels()
                .border_style(&WHITE.mix(0.2))
                .background_style(&style.background)
                .label_font(("sans-serif", 14).into_font().color(&WHITE))
                .draw()?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ChartError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_table::{ChannelCell, RenderRow};
    fn table() -> RenderTable {
        let cells = [Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)];
        RenderTable {
            channel_labels: vec!["Cz".into()],
            rows: cells
                .iter()
                .enumerate()
                .map(|(i, v)| RenderRow {
                    time: i as f64,
                    time_text: String::new(),
                    annotation_label: (i == 1).then(|| "A".to_owned()),
                    annotation_html: None,
                    cells: vec![v.map(|v| ChannelCell {
                        display: v,
                        render: v,
                    })],
                    tooltips: vec![None],
                })
                .collect(),
        }
    }
    #[test]
    fn gaps_split_series_into_segments() {
        let window = VisibleWindow {
            start: 0.0,
            end: 10.0,
        };
        let segments = series_segments(&table(), 0, window);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], vec![(0.0, 1.0), (1.0, 2.0)]);
        assert_eq!(segments[1].len(), 2);
        let narrow = VisibleWindow {
            start: 3.0,
            end: 4.0,
        };
        assert_eq!(series_segments(&table(), 0, narrow), vec![vec![(3.0, 4.0)]]);
    }
    #[test]
    fn renders_overlays_and_annotations_to_png() {
        let style = SnapshotStyle {
            width: 240,
            height: 160,
            show_labels: false,
            ..SnapshotStyle::default()
        };
        let overlay = OverlayShape {
            start: 0.5,
            end: 2.5,
            fill: [0, 150, 136, 80],
            label: "spindle".into(),
        };
        let window = VisibleWindow {
            start: 0.0,
            end: 5.0,
        };
        let bytes = render_snapshot_png(&table(), &[overlay], window, &style).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (240, 160));
    }
    #[test]
    fn empty_table_is_rejected() {
        let err = render_snapshot_png(
            &RenderTable::default(),
            &[],
            VisibleWindow {
                start: 0.0,
                end: 1.0,
            },
            &SnapshotStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::Plot(_)));
    }
}
