use crate::error::ChartError;
/// Immutable window of multi-channel EEG/ECG samples as delivered by the store.
///
/// `times` is column 0 of the upstream table: per-row offsets in seconds from the
/// recording start. `samples` holds one column per channel; `None` marks an instant
/// with no data for that channel.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalChunk {
    pub start_time: f64,
    pub duration: f64,
    pub sample_rate_hz: f64,
    pub channel_labels: Vec<String>,
    pub times: Vec<f64>,
    pub samples: Vec<Vec<Option<f64>>>, // channels x rows
}
impl SignalChunk {
    pub fn validate(&self) -> Result<(), ChartError> {
        if !(self.sample_rate_hz > 0.0) {
            return Err(ChartError::InvalidSampleRate);
        }
        if self.samples.len() != self.channel_labels.len() {
            return Err(ChartError::ChannelMismatch {
                expected: self.channel_labels.len(),
                actual: self.samples.len(),
            });
        }
        for (idx, column) in self.samples.iter().enumerate() {
            if column.len() != self.times.len() {
                return Err(ChartError::RowMismatch {
                    column: idx + 1,
                    expected: self.times.len(),
                    actual: column.len(),
                });
            }
        }
        Ok(())
    }
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }
    pub fn num_rows(&self) -> usize {
        self.times.len()
    }
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}
/// Builds a chunk on a regular sampling grid starting at `start_time`.
pub fn make_chunk(
    sample_rate_hz: f64,
    start_time: f64,
    channel_labels: Vec<String>,
    samples: Vec<Vec<Option<f64>>>,
) -> SignalChunk {
    let rows = samples.first().map(|c| c.len()).unwrap_or(0);
    let times = (0..rows)
        .map(|i| start_time + i as f64 / sample_rate_hz)
        .collect();
    SignalChunk {
        start_time,
        duration: rows as f64 / sample_rate_hz,
        sample_rate_hz,
        channel_labels,
        times,
        samples,
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn grid_times_follow_sample_rate() {
        let chunk = make_chunk(
            250.0,
            2.0,
            vec!["Fp1".into()],
            vec![vec![Some(1.0), None, Some(3.0), Some(4.0)]],
        );
        assert_eq!(chunk.num_rows(), 4);
        assert_eq!(chunk.times[0], 2.0);
        assert!((chunk.times[2] - 2.008).abs() < 1e-12);
        assert!((chunk.duration - 0.016).abs() < 1e-12);
        chunk.validate().unwrap();
    }
    #[test]
    fn ragged_columns_are_rejected() {
        let mut chunk = make_chunk(
            250.0,
            0.0,
            vec!["Fp1".into(), "Fp2".into()],
            vec![vec![Some(1.0); 3], vec![Some(1.0); 3]],
        );
        chunk.samples[1].pop();
        match chunk.validate() {
            Err(ChartError::RowMismatch {
                column,
                expected,
                actual,
            }) => {
                assert_eq!((column, expected, actual), (2, 3, 2));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
    #[test]
    fn label_count_must_match() {
        let chunk = make_chunk(250.0, 0.0, vec!["Fp1".into()], vec![vec![], vec![]]);
        assert!(matches!(
            chunk.validate(),
            Err(ChartError::ChannelMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }
}
