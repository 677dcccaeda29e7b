use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the export pipeline.
///
/// Construction and per-event errors are local and synchronous: there is no
/// retry or recovery path anywhere in the crate. The batch driver may skip a
/// sequence on `MissingInput`, but `MalformedRecord` is always fatal since
/// dropping pose samples silently would desynchronize the event/label streams.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("event ({x}, {y}) outside {width}x{height} surface")]
    OutOfBounds {
        x: u16,
        y: u16,
        width: usize,
        height: usize,
    },

    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),
}

impl Error {
    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}
