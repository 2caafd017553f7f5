use std::sync::mpsc::Sender;
use log::warn;
use serde::{Deserialize, Serialize};
// Actions the chart emits to the dispatch bus
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartAction {
    CreateWaveEvent {
        label_text: String,
        start_time: f64,
        duration: f64,
    },
}
/// Receiving end of the dispatch bus.
pub trait ActionSink {
    fn dispatch(&mut self, action: ChartAction);
}
impl ActionSink for Vec<ChartAction> {
    fn dispatch(&mut self, action: ChartAction) {
        self.push(action);
    }
}
impl ActionSink for Sender<ChartAction> {
    fn dispatch(&mut self, action: ChartAction) {
        if let Err(err) = self.send(action) {
            warn!("dispatch bus closed, dropping {:?}", err.0);
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    #[test]
    fn serializes_with_type_tag() {
        let action = ChartAction::CreateWaveEvent {
            label_text: "spike".into(),
            start_time: 2.0,
            duration: 3.0,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "create_wave_event");
        assert_eq!(json["duration"], 3.0);
    }
    #[test]
    fn channel_sink_forwards() {
        let (mut tx, rx) = channel::<ChartAction>();
        tx.dispatch(ChartAction::CreateWaveEvent {
            label_text: "x".into(),
            start_time: 0.0,
            duration: 1.0,
        });
        assert!(rx.try_recv().is_ok());
    }
}
