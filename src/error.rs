use thiserror::Error;
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("global sensitivity must be non-zero")]
    ZeroSensitivity,
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("column {column} has {actual} rows, expected {expected}")]
    RowMismatch {
        column: usize,
        expected: usize,
        actual: usize,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to render snapshot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ChartError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ChartError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for ChartError {
    fn from(value: image::ImageError) -> Self {
        ChartError::Plot(value.to_string())
    }
}
impl From<serde_json::Error> for ChartError {
    fn from(value: serde_json::Error) -> Self {
        ChartError::Config(value.to_string())
    }
}
impl From<std::io::Error> for ChartError {
    fn from(value: std::io::Error) -> Self {
        ChartError::Config(value.to_string())
    }
}
