// src/gui.rs
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Text, VLine};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use neurochart::demo::{spawn_pager, PageRequest};
use neurochart::gating::subscribed_fields;
use neurochart::{
    channel_label_id, point_id, Annotation, ChangedFields, ChartAction, ChartConfig, ChartSurface,
    OverlayShape, PointerEvent, PredictionMode, RecordingType, RenderTable, ScreenPoint,
    SensitivityChange, SignalChunk, Snapshot, SnapshotStore, SnapshotStyle, VisibleWindow,
    WaveformChart, PlotGeometry,
};
/// Clinical sensitivity ladder in µV/mm.
const SENSITIVITY_STEPS: &[f64] = &[1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 15.0, 20.0, 30.0, 50.0, 70.0, 100.0];
const TIME_SCALES: &[f64] = &[5.0, 10.0, 20.0, 30.0];
const SAMPLE_RATE_HZ: f64 = 256.0;
const EXPORT_PATH: &str = "neurochart-snapshot.png";
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static tag pattern"));
/// Tooltip and annotation bodies are HTML; egui wants plain text.
fn plain_text(html: &str) -> String {
    TAG.replace_all(&html.replace("<br/>", "\n"), "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
fn to_color(fill: [u8; 4]) -> Color32 {
    let [r, g, b, a] = fill;
    Color32::from_rgba_unmultiplied(r, g, b, a)
}
/// What the plot paints this frame, refreshed only when the chart asks.
#[derive(Default)]
struct PlotSurface {
    series: Vec<(String, Vec<[f64; 2]>)>,
    annotations: Vec<(f64, String)>,
    overlays: Vec<OverlayShape>,
    window: Option<VisibleWindow>,
    prediction: PredictionMode,
}
impl ChartSurface for PlotSurface {
    fn redraw_content(&mut self, table: &RenderTable, window: VisibleWindow, prediction: PredictionMode) {
        self.series = (0..table.channel_count())
            .map(|s| {
                (
                    table.series_label(s).unwrap_or_default().to_owned(),
                    table.series_points(s),
                )
            })
            .collect();
        self.annotations = table
            .annotated_rows()
            .filter_map(|(_, row)| Some((row.time, plain_text(row.annotation_html.as_deref()?))))
            .collect();
        self.window = Some(window);
        self.prediction = prediction;
    }
    fn redraw_overlay(&mut self, shapes: &[OverlayShape]) {
        self.overlays = shapes.to_vec();
    }
    fn clear(&mut self) {
        *self = Self::default();
    }
}
pub struct ViewerApp {
    store: SnapshotStore,
    chart: WaveformChart<Sender<ChartAction>>,
    surface: PlotSurface,
    pending: Rc<RefCell<Vec<ChangedFields>>>,
    rx_actions: Receiver<ChartAction>,
    rx_chunks: Receiver<Arc<SignalChunk>>,
    tx_pages: Sender<PageRequest>,
    page_in_flight: bool,
    note_label: String,
    log_messages: Vec<String>,
}
impl ViewerApp {
    pub fn new(config: ChartConfig) -> Self {
        let (tx_actions, rx_actions) = channel();
        let (tx_chunks, rx_chunks) = channel();
        let (tx_pages, rx_pages) = channel();
        spawn_pager(RecordingType::Eeg, SAMPLE_RATE_HZ, tx_chunks, rx_pages);
        let snapshot = Snapshot {
            absolute_start: chrono::Utc::now().timestamp() as f64,
            ..Snapshot::default()
        };
        let mut store = SnapshotStore::new(snapshot);
        let pending = Rc::new(RefCell::new(Vec::new()));
        let queue = Rc::clone(&pending);
        store.subscribe(subscribed_fields(), move |_, changed| {
            queue.borrow_mut().push(changed.clone());
        });
        let mut app = Self {
            store,
            chart: WaveformChart::new(config, tx_actions),
            surface: PlotSurface::default(),
            pending,
            rx_actions,
            rx_chunks,
            tx_pages,
            page_in_flight: false,
            note_label: "arousal".to_owned(),
            log_messages: vec!["neurochart viewer ready.".to_owned()],
        };
        app.request_page(0.0);
        app
    }
    fn log(&mut self, msg: &str) {
        info!("{msg}");
        self.log_messages.push(format!("> {msg}"));
        if self.log_messages.len() > 8 {
            self.log_messages.remove(0);
        }
    }
    fn request_page(&mut self, start_time: f64) {
        let duration = self.store.snapshot().time_scale;
        let req = PageRequest {
            start_time: start_time.max(0.0),
            duration,
        };
        if self.tx_pages.send(req).is_ok() {
            self.page_in_flight = true;
        } else {
            warn!("demo pager is gone");
        }
    }
    /// Pulls pages and actions into the store, then lets the chart react.
    fn pump(&mut self) {
        while let Ok(chunk) = self.rx_chunks.try_recv() {
            self.page_in_flight = false;
            self.store.update(|s| s.load_chunk(Some(chunk)));
        }
        while let Ok(action) = self.rx_actions.try_recv() {
            self.store.dispatch(&action);
            let ChartAction::CreateWaveEvent { label_text, .. } = &action;
            self.log(&format!("wave event '{label_text}' added"));
        }
        let pending: Vec<ChangedFields> = self.pending.borrow_mut().drain(..).collect();
        for changed in pending {
            self.chart
                .on_state_change(self.store.snapshot(), &changed, &mut self.surface);
        }
    }
    fn step_sensitivity(&mut self, up: bool) {
        let current = self.store.snapshot().global_sensitivity;
        let idx = SENSITIVITY_STEPS
            .iter()
            .position(|s| *s >= current)
            .unwrap_or(SENSITIVITY_STEPS.len() - 1);
        let next = if up {
            SENSITIVITY_STEPS[(idx + 1).min(SENSITIVITY_STEPS.len() - 1)]
        } else {
            SENSITIVITY_STEPS[idx.saturating_sub(1)]
        };
        self.store.update(|s| s.global_sensitivity = next);
    }
    fn click_point(&mut self, coord: PlotPoint, pos: egui::Pos2) {
        let Some(table) = self.chart.table() else {
            return;
        };
        let Some(row) = table.nearest_row(coord.x) else {
            return;
        };
        let height = self.store.snapshot().channel_height;
        let n = table.channel_count();
        if n == 0 {
            return;
        }
        let series = ((coord.y / height).floor().max(0.0) as usize).min(n - 1);
        self.chart.on_pointer(&PointerEvent {
            element_id: point_id(series, row),
            pos: ScreenPoint::new(pos.x, pos.y),
        });
    }
    fn hover_text(&self, coord: PlotPoint) -> Option<String> {
        let table = self.chart.table()?;
        let row = table.nearest_row(coord.x)?;
        let height = self.store.snapshot().channel_height;
        let series = (coord.y / height).floor();
        if series < 0.0 {
            return None;
        }
        table.tooltip(series as usize, row).map(plain_text)
    }
    fn export(&mut self) {
        let result = self
            .chart
            .export_png(&SnapshotStyle::default())
            .map_err(anyhow::Error::from)
            .and_then(|bytes| std::fs::write(EXPORT_PATH, bytes).map_err(anyhow::Error::from));
        match result {
            Ok(()) => self.log(&format!("saved {EXPORT_PATH}")),
            Err(err) => {
                warn!("export failed: {err:#}");
                self.log(&format!("export failed: {err}"));
            }
        }
    }
    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("controls").min_width(240.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("neurochart");
            ui.separator();
            let snapshot = self.store.snapshot().clone();
            ui.horizontal(|ui| {
                if ui.button("◀ Prev").clicked() {
                    self.request_page(snapshot.chunk_start - snapshot.time_scale);
                }
                if ui.button("Next ▶").clicked() {
                    self.request_page(snapshot.chunk_start + snapshot.time_scale);
                }
            });
            if self.page_in_flight {
                ui.label(RichText::new("loading page...").small());
            }
            ui.horizontal(|ui| {
                ui.label(format!("Sensitivity {} µV/mm", snapshot.global_sensitivity));
                if ui.small_button("-").clicked() {
                    self.step_sensitivity(false);
                }
                if ui.small_button("+").clicked() {
                    self.step_sensitivity(true);
                }
            });
            ui.horizontal(|ui| {
                ui.label("Window");
                for &scale in TIME_SCALES {
                    if ui
                        .selectable_label(snapshot.time_scale == scale, format!("{scale}s"))
                        .clicked()
                        && snapshot.time_scale != scale
                    {
                        self.store.update(|s| s.time_scale = scale);
                        self.request_page(snapshot.chunk_start);
                    }
                }
            });
            ui.horizontal(|ui| {
                let mut mode = snapshot.prediction_mode;
                ui.selectable_value(&mut mode, PredictionMode::Hidden, "Signal");
                ui.selectable_value(&mut mode, PredictionMode::Overlay, "Overlay");
                ui.selectable_value(&mut mode, PredictionMode::Only, "Events only");
                if mode != snapshot.prediction_mode {
                    self.store.update(|s| s.prediction_mode = mode);
                }
            });
            ui.separator();
            ui.label("CHANNELS");
            let labels: Vec<String> = self
                .chart
                .table()
                .map(|t| t.channel_labels.clone())
                .unwrap_or_default();
            egui::ScrollArea::vertical()
                .id_source("channel-list")
                .max_height(260.0)
                .show(ui, |ui| {
                    for label in labels {
                        let selected = self.chart.channel_menu().selected() == Some(label.as_str());
                        let resp = ui.selectable_label(selected, label.as_str());
                        if resp.clicked() {
                            let at = resp.rect.center();
                            self.chart.on_pointer(&PointerEvent {
                                element_id: channel_label_id(&label),
                                pos: ScreenPoint::new(at.x, at.y),
                            });
                        }
                    }
                });
            ui.separator();
            ui.label("NOTES");
            ui.text_edit_singleline(&mut self.note_label);
            let anchor = self.chart.interval().selection().map(|(start, _)| start);
            if ui
                .add_enabled(anchor.is_some(), egui::Button::new("Annotate first click"))
                .clicked()
            {
                if let Some(start_time) = anchor {
                    let label = self.note_label.clone();
                    self.store.update(|s| s.annotations.push(Annotation { start_time, label }));
                }
            }
            ui.label(format!("{} wave events", snapshot.wave_events.len()));
            if ui.button("Export PNG").clicked() {
                self.export();
            }
            ui.add_space(10.0);
            egui::ScrollArea::vertical()
                .id_source("log")
                .max_height(120.0)
                .show(ui, |ui| {
                    for m in &self.log_messages {
                        ui.monospace(m);
                    }
                });
        });
    }
    fn central_panel(&mut self, ctx: &egui::Context) {
        let fill = to_color(self.chart.config().overlay_fill);
        let snapshot = self.store.snapshot();
        let top = snapshot.channel_height * self.surface.series.len().max(1) as f64;
        let window = self.surface.window.unwrap_or_else(|| snapshot.visible_window());
        let selection = self.chart.interval().selection();
        let surface = &self.surface;
        let plot = egui::CentralPanel::default()
            .show(ctx, |ui| {
                Plot::new("waveforms")
                    .allow_drag(false)
                    .allow_zoom(false)
                    .allow_scroll(false)
                    .allow_boxed_zoom(false)
                    .show_y(false)
                    .include_x(window.start)
                    .include_x(window.end)
                    .include_y(0.0)
                    .include_y(top)
                    .show(ui, |plot_ui| {
                        for shape in &surface.overlays {
                            plot_ui.line(
                                Line::new(PlotPoints::new(vec![[shape.start, top], [shape.end, top]]))
                                    .fill(0.0)
                                    .color(fill),
                            );
                            plot_ui.text(
                                Text::new(PlotPoint::new((shape.start + shape.end) / 2.0, top), shape.label.as_str())
                                    .color(Color32::WHITE),
                            );
                        }
                        if surface.prediction != PredictionMode::Only {
                            for (i, (label, points)) in surface.series.iter().enumerate() {
                                let color = if i % 2 == 0 {
                                    Color32::from_rgb(0, 255, 255)
                                } else {
                                    Color32::YELLOW
                                };
                                plot_ui.line(
                                    Line::new(PlotPoints::new(points.clone()))
                                        .name(label)
                                        .color(color)
                                        .width(1.0),
                                );
                            }
                        }
                        for (time, text) in &surface.annotations {
                            plot_ui.vline(VLine::new(*time).color(Color32::from_rgb(255, 152, 0)));
                            plot_ui.text(
                                Text::new(PlotPoint::new(*time, 0.0), text.as_str())
                                    .color(Color32::from_rgb(255, 152, 0)),
                            );
                        }
                        if let Some((start, end)) = selection {
                            plot_ui.vline(VLine::new(start).color(Color32::WHITE));
                            plot_ui.vline(VLine::new(end).color(Color32::WHITE));
                        }
                        plot_ui.pointer_coordinate()
                    })
            })
            .inner;
        self.chart.set_geometry(PlotGeometry {
            plot_left: plot.response.rect.left(),
            viewport_height: ctx.screen_rect().height(),
        });
        let Some(coord) = plot.inner else {
            return;
        };
        if plot.response.clicked() {
            if let Some(pos) = plot.response.interact_pointer_pos() {
                self.click_point(coord, pos);
            }
        }
        if let Some(text) = self.hover_text(coord) {
            plot.response.on_hover_text(text);
        }
    }
    fn popups(&mut self, ctx: &egui::Context) {
        let form = self.chart.interval().form().clone();
        if form.visible {
            let mut label = form.label.clone();
            let (mut confirm, mut cancel) = (false, false);
            egui::Window::new("New wave event")
                .fixed_pos(egui::pos2(form.position.x, form.position.y))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(format!("Start  {}", form.start_text));
                    if form.end_text.is_empty() {
                        ui.label(RichText::new("Click a second point for the end").small());
                    } else {
                        ui.label(format!("End    {}", form.end_text));
                    }
                    ui.text_edit_singleline(&mut label);
                    ui.horizontal(|ui| {
                        confirm = ui.button("Confirm").clicked();
                        cancel = ui.button("Cancel").clicked();
                    });
                });
            self.chart.interval_mut().form_mut().label = label;
            if confirm {
                self.chart.confirm_interval();
            } else if cancel {
                self.chart.cancel_interval();
            }
        }
        let menu = self.chart.channel_menu();
        if menu.is_open() {
            let pos = menu.position();
            let title = menu.title().to_owned();
            let mut change = None;
            let mut close = false;
            egui::Window::new(format!("Channel {title}"))
                .id(egui::Id::new("channel-menu"))
                .fixed_pos(egui::pos2(pos.x, pos.y))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("Increase").clicked() {
                            change = Some(SensitivityChange::Increase);
                        }
                        if ui.button("Decrease").clicked() {
                            change = Some(SensitivityChange::Decrease);
                        }
                        if ui.button("Reset").clicked() {
                            change = Some(SensitivityChange::Reset);
                        }
                    });
                    close = ui.button("Close").clicked();
                });
            if let Some(change) = change {
                if !self.chart.adjust_sensitivity(change, Some(&mut self.surface)) {
                    self.log(&format!("{title}: nothing to rescale yet"));
                }
            }
            if close {
                self.chart.close_channel_menu();
            }
        }
    }
}
impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump();
        ctx.set_visuals(egui::Visuals::dark());
        self.side_panel(ctx);
        self.central_panel(ctx);
        self.popups(ctx);
        // Pages and dispatched actions arrive over channels.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
