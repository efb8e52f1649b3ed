//! Error types for streamforged-container.

use std::io;
use thiserror::Error;

/// Result type for container reader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for container reader operations.
///
/// Framing errors are fatal to the scan that hit them but not to the reader:
/// the caller may reposition the stream and try again. Codec identification
/// never produces an error.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fewer bytes remain than a fixed header requires.
    #[error("Unexpected end of stream: need {need} bytes, have {have}")]
    UnexpectedEndOfStream { need: u64, have: u64 },

    /// Framing or mandatory structure is invalid.
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// A `0xFFFFFFFF` length was found in an RF64 file without a usable `ds64` chunk.
    #[error("Malformed container: chunk at offset {offset} needs a ds64 size override, none was captured")]
    MissingSizeOverride { offset: u64 },

    /// A payload read exceeded the configured limit.
    #[error("Payload of {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: u64, max: u64 },

    /// Container format could not be identified.
    #[error("Unsupported container format: {0}")]
    UnsupportedContainer(String),

    /// Operation is not implemented for this reader.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a malformed container error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedContainer(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Whether this error was caused by structurally invalid framing.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedContainer(_) | Self::MissingSizeOverride { .. }
        )
    }
}
