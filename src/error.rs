use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloakError {
    #[error("video source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("output sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error(
        "frame is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("frame buffer size mismatch: got {actual}, expected {expected}")]
    InvalidFrame { expected: usize, actual: usize },

    #[error("frame dimensions must be non-zero")]
    EmptyFrame,
}
