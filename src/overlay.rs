use crate::store::{VisibleWindow, WaveEvent};
/// Filled rectangle spanning the whole plot height between `start` and `end`.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayShape {
    pub start: f64,
    pub end: f64,
    pub fill: [u8; 4],
    pub label: String,
}
/// Shapes for every wave event overlapping `window`, clipped to it.
///
/// Nothing is cached: each call walks the current events again.
pub fn overlay_shapes<'a>(
    window: VisibleWindow,
    events: &'a [WaveEvent],
    fill: [u8; 4],
) -> impl Iterator<Item = OverlayShape> + 'a {
    events
        .iter()
        .filter(move |event| overlaps(event, &window))
        .map(move |event| OverlayShape {
            start: event.start_time.max(window.start),
            end: event.end_time().min(window.end),
            fill,
            label: event.label.clone(),
        })
}
pub fn overlaps(event: &WaveEvent, window: &VisibleWindow) -> bool {
    event.start_time < window.end && window.start < event.end_time()
}
#[cfg(test)]
mod tests {
    use super::*;
    fn event(start_time: f64, duration: f64) -> WaveEvent {
        WaveEvent {
            start_time,
            duration,
            label: format!("ev@{start_time}"),
        }
    }
    const FILL: [u8; 4] = [255, 0, 0, 80];
    #[test]
    fn clips_to_window_and_drops_disjoint_events() {
        let window = VisibleWindow {
            start: 10.0,
            end: 20.0,
        };
        let events = vec![event(18.0, 5.0), event(5.0, 3.0), event(8.0, 4.0)];
        let shapes: Vec<_> = overlay_shapes(window, &events, FILL).collect();
        assert_eq!(shapes.len(), 2);
        assert_eq!((shapes[0].start, shapes[0].end), (18.0, 20.0));
        assert_eq!((shapes[1].start, shapes[1].end), (10.0, 12.0));
        assert_eq!(shapes[0].fill, FILL);
    }
    #[test]
    fn touching_edges_do_not_overlap() {
        let window = VisibleWindow {
            start: 10.0,
            end: 20.0,
        };
        assert!(!overlaps(&event(20.0, 1.0), &window));
        assert!(!overlaps(&event(9.0, 1.0), &window));
        assert!(overlaps(&event(0.0, 30.0), &window));
    }
    #[test]
    fn reflects_current_events_on_every_call() {
        let window = VisibleWindow {
            start: 0.0,
            end: 10.0,
        };
        let mut events = vec![event(1.0, 1.0)];
        assert_eq!(overlay_shapes(window, &events, FILL).count(), 1);
        events.push(event(3.0, 1.0));
        assert_eq!(overlay_shapes(window, &events, FILL).count(), 2);
    }
}
