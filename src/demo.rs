//! Synthetic polysomnography-style recordings for the demo viewer.
use std::f64::consts::TAU;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use log::{debug, info};
use rand::Rng;
use crate::chunk::{make_chunk, SignalChunk};
use crate::store::RecordingType;
pub const EEG_MONTAGE: &[&str] = &[
    "Fp1", "Fp2", "C3", "C4", "O1", "O2", "LOC", "ROC", "EMG chin", "ECG", "Thor", "Abd",
];
pub const EKG_MONTAGE: &[&str] = &[
    "I", "II", "III", "aVR", "aVL", "aVF", "V1", "V2", "V3", "V4", "V5", "V6",
];
pub fn montage(recording_type: RecordingType) -> &'static [&'static str] {
    match recording_type {
        RecordingType::Ekg => EKG_MONTAGE,
        _ => EEG_MONTAGE,
    }
}
/// A page of recording the viewer wants next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageRequest {
    pub start_time: f64,
    pub duration: f64,
}
/// Rough amplitude (µV) and dominant frequency (Hz) for a channel name.
fn channel_profile(label: &str) -> (f64, f64) {
    let lower = label.to_ascii_lowercase();
    if lower.starts_with("ecg") || lower.starts_with("ekg") {
        (800.0, 1.2)
    } else if lower.starts_with("emg") {
        (30.0, 40.0)
    } else if lower == "loc" || lower == "roc" {
        (120.0, 0.4)
    } else if lower.starts_with("thor") || lower.starts_with("abd") {
        (300.0, 0.25)
    } else if lower.starts_with('v') || ["i", "ii", "iii", "avr", "avl", "avf"].contains(&lower.as_str()) {
        (1000.0, 1.2)
    } else {
        (40.0, 10.0)
    }
}
/// One chunk of noisy sinusoids; one channel gets a short dropout of empty samples.
pub fn synthetic_chunk<R: Rng>(
    rng: &mut R,
    recording_type: RecordingType,
    sample_rate_hz: f64,
    start_time: f64,
    duration: f64,
) -> SignalChunk {
    let labels = montage(recording_type);
    let rows = (duration * sample_rate_hz).round().max(0.0) as usize;
    let dropout_channel = rng.gen_range(0..labels.len());
    let dropout_start = rng.gen_range(0..rows.max(1));
    let dropout_len = (sample_rate_hz * 0.2) as usize;
    let samples = labels
        .iter()
        .enumerate()
        .map(|(channel, label)| {
            let (amplitude, freq) = channel_profile(label);
            let phase = rng.gen_range(0.0..TAU);
            (0..rows)
                .map(|row| {
                    if channel == dropout_channel
                        && row >= dropout_start
                        && row < dropout_start + dropout_len
                    {
                        return None;
                    }
                    let t = start_time + row as f64 / sample_rate_hz;
                    let noise = rng.gen_range(-0.15..0.15);
                    Some(amplitude * ((TAU * freq * t + phase).sin() + noise))
                })
                .collect()
        })
        .collect();
    make_chunk(
        sample_rate_hz,
        start_time,
        labels.iter().map(|l| (*l).to_owned()).collect(),
        samples,
    )
}
/// Serves page requests on a background thread until either channel closes.
pub fn spawn_pager(
    recording_type: RecordingType,
    sample_rate_hz: f64,
    tx: Sender<Arc<SignalChunk>>,
    rx_req: Receiver<PageRequest>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        info!("demo pager ready ({recording_type:?}, {sample_rate_hz} Hz)");
        let mut rng = rand::thread_rng();
        for req in rx_req {
            debug!("generating page at {}s", req.start_time);
            let chunk = synthetic_chunk(
                &mut rng,
                recording_type,
                sample_rate_hz,
                req.start_time.max(0.0),
                req.duration,
            );
            if tx.send(Arc::new(chunk)).is_err() {
                break;
            }
        }
        info!("demo pager stopped");
    })
}
