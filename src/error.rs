//! Error types.
//!
//! [`QrError`] covers failures the caller has to see: a pixel buffer whose
//! byte length does not match its dimensions, or an image that could not be
//! loaded. Not finding a QR code is not an error; the orchestrator reports it
//! as `None` or an empty list.
//!
//! [`EngineError`] is what a decode engine collaborator reports. The
//! orchestrator never returns it: an engine failure only means "no result for
//! this engine on this pass".

use thiserror::Error;

/// Fatal errors returned by the loading and buffer construction APIs.
#[derive(Debug, Error)]
pub enum QrError {
    /// Pixel data does not hold exactly `width * height * 4` bytes.
    #[error("pixel buffer {width}x{height} needs {expected} bytes, got {actual}")]
    InvalidBufferLength {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
        /// `width * height * 4`
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// `width * height * 4` does not fit in memory addressing.
    #[error("pixel buffer dimensions {width}x{height} overflow")]
    DimensionOverflow {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
    },

    /// The input held no bytes at all.
    #[error("empty image input")]
    EmptyInput,

    /// The image codec could not decode the input.
    #[error("failed to decode image: {0}")]
    ImageLoad(#[from] image::ImageError),

    /// Reading the input failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A base64 or data-URL string was malformed.
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decode worker reported an error message.
    #[error("decode worker failed: {0}")]
    Worker(String),
}

/// Failure reported by a decode engine collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The capability does not exist on this platform.
    #[error("decode engine unsupported on this platform")]
    Unsupported,

    /// The engine ran and failed (no finder pattern, checksum failure, ...).
    #[error("decode engine failed: {0}")]
    Failed(String),
}
