use thiserror::Error;

/// Errors produced while building, configuring, or running the blur filter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The composed WGSL does not declare a uniform member the filter writes to.
    #[error("shader does not declare uniform `{0}`")]
    MissingUniform(&'static str),
    /// The weight strategy did not provide `fn blur_weight`.
    #[error("weight function WGSL does not define `fn blur_weight`")]
    MissingWeightFunction,
    #[error("output size must be positive, got {width}x{height}")]
    InvalidOutputSize { width: u32, height: u32 },
    #[error("blur size must be finite and non-negative, got {0}")]
    InvalidBlurSize(f32),
    #[error("no source texture has been loaded")]
    SourceNotLoaded,
    #[error("source data is {actual} bytes but {expected} were expected")]
    SourceSizeMismatch { expected: usize, actual: usize },
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to request GPU device: {0}")]
    RequestDevice(String),
    #[error("failed to read back rendered pixels: {0}")]
    Readback(String),
    /// The filter owning the command queue has been dropped.
    #[error("filter command queue is disconnected")]
    QueueDisconnected,
}
