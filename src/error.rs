use std::path::PathBuf;

use thiserror::Error;

/// Errors arising from container decoding and derived-data requests.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot open {path}: {source}")]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid container format: {0}")]
    InvalidFormat(String),

    #[error("unsupported format revision (parameter signature 0x{signature:02X})")]
    UnsupportedVersion { signature: u8 },

    #[error("corrupted data reading {what}: need {need} bytes at offset {offset}, have {got}")]
    CorruptedData {
        what: &'static str,
        offset: usize,
        need: usize,
        got: usize,
    },

    #[error("missing required data: {0}")]
    MissingRequiredData(String),
}

impl CaptureError {
    /// Create a `CorruptedData` error for a read that would run past the buffer.
    pub(crate) fn short_read(what: &'static str, offset: usize, need: usize, got: usize) -> Self {
        Self::CorruptedData {
            what,
            offset,
            need,
            got,
        }
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;
