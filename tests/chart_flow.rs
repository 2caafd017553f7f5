use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::channel;
use std::sync::Arc;
use neurochart::gating::subscribed_fields;
use neurochart::{
    channel_label_id, make_chunk, point_id, ChangedFields, ChartAction, ChartConfig, ChartSurface,
    OverlayShape, PointerEvent, PredictionMode, RenderTable, ScreenPoint, SensitivityChange,
    Snapshot, SnapshotStore, VisibleWindow, WaveformChart,
};
#[derive(Default)]
struct Recorder {
    content_redraws: usize,
    overlays: Vec<OverlayShape>,
    window: Option<VisibleWindow>,
}
impl ChartSurface for Recorder {
    fn redraw_content(&mut self, _: &RenderTable, window: VisibleWindow, _: PredictionMode) {
        self.content_redraws += 1;
        self.window = Some(window);
    }
    fn redraw_overlay(&mut self, shapes: &[OverlayShape]) {
        self.overlays = shapes.to_vec();
    }
}
fn pump(
    store: &SnapshotStore,
    pending: &Rc<RefCell<Vec<ChangedFields>>>,
    chart: &mut WaveformChart<std::sync::mpsc::Sender<ChartAction>>,
    surface: &mut Recorder,
) {
    let queued: Vec<ChangedFields> = pending.borrow_mut().drain(..).collect();
    for changed in queued {
        chart.on_state_change(store.snapshot(), &changed, surface);
    }
}
#[test]
fn interval_selection_round_trips_into_overlay() {
    let (tx, rx) = channel::<ChartAction>();
    let mut chart = WaveformChart::new(ChartConfig::default(), tx);
    let mut surface = Recorder::default();
    let mut store = SnapshotStore::new(Snapshot {
        global_sensitivity: 1.0,
        ..Snapshot::default()
    });
    let pending = Rc::new(RefCell::new(Vec::new()));
    let queue = Rc::clone(&pending);
    store.subscribe(subscribed_fields(), move |_, changed| {
        queue.borrow_mut().push(changed.clone());
    });
    let chunk = make_chunk(
        10.0,
        0.0,
        vec!["Fp1".into(), "ECG".into()],
        vec![vec![Some(5.0); 100], vec![Some(100.0); 100]],
    );
    store.update(|s| s.load_chunk(Some(Arc::new(chunk))));
    pump(&store, &pending, &mut chart, &mut surface);
    assert_eq!(surface.content_redraws, 1);
    assert_eq!(
        surface.window,
        Some(VisibleWindow {
            start: 0.0,
            end: 10.0
        })
    );
    let table = chart.table().expect("table after first load");
    // ECG is scaled down tenfold on EEG recordings and sits at the bottom.
    assert_eq!(table.display_value(0, 0), Some(100.0));
    assert_eq!(table.series_points(0)[0], [0.0, 100.0 * 0.1 + 50.0]);
    // Two clicks at rows 20 and 45 span 2.0 s .. 4.5 s.
    for row in [20, 45] {
        chart.on_pointer(&PointerEvent {
            element_id: point_id(1, row),
            pos: ScreenPoint::new(500.0, 120.0),
        });
    }
    chart.interval_mut().form_mut().label = "spindle".into();
    assert!(chart.confirm_interval());
    for action in rx.try_iter() {
        store.dispatch(&action);
    }
    pump(&store, &pending, &mut chart, &mut surface);
    assert_eq!(surface.content_redraws, 1);
    assert_eq!(surface.overlays.len(), 1);
    assert_eq!(surface.overlays[0].start, 2.0);
    assert_eq!(surface.overlays[0].end, 4.5);
    assert_eq!(surface.overlays[0].label, "spindle");
}
#[test]
fn channel_menu_rescales_one_channel_only() {
    let (tx, _rx) = channel::<ChartAction>();
    let mut chart = WaveformChart::new(ChartConfig::default(), tx);
    let mut surface = Recorder::default();
    let mut snapshot = Snapshot {
        global_sensitivity: 2.0,
        ..Snapshot::default()
    };
    snapshot.load_chunk(Some(Arc::new(make_chunk(
        10.0,
        0.0,
        vec!["C3".into(), "C4".into()],
        vec![vec![Some(4.0); 10], vec![Some(4.0); 10]],
    ))));
    chart.on_state_change(&snapshot, &ChangedFields::all(), &mut surface);
    chart.on_pointer(&PointerEvent {
        element_id: channel_label_id("C3"),
        pos: ScreenPoint::new(5.0, 200.0),
    });
    assert!(chart.adjust_sensitivity(SensitivityChange::Decrease, Some(&mut surface)));
    assert_eq!(surface.content_redraws, 2);
    assert_eq!(chart.cache().get("C3"), Some(0.25));
    assert_eq!(chart.cache().get("C4"), Some(0.5));
    let table = chart.table().expect("table");
    // C3 is the top series: offset 150.
    assert_eq!(table.series_points(1)[0][1], 4.0 * 0.25 + 150.0);
    assert_eq!(table.series_points(0)[0][1], 4.0 * 0.5 + 50.0);
    assert!(chart.adjust_sensitivity(SensitivityChange::Reset, Some(&mut surface)));
    assert_eq!(chart.cache().get("C3"), Some(0.5));
}
