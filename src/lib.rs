//! qr_cascade - multi-pass QR code decoding
//!
//! A decode attempt first offers the untouched image to the native engine.
//! When that fails, a bounded list of preprocessing passes (grayscale,
//! adaptive thresholds, inversions, denoise, transparency flattening and an
//! optional colour hint) is generated and each pass is tried on the native
//! engine and then the software engine.
//!
//! ```no_run
//! use qr_cascade::{DecodeOptions, ImageInput};
//!
//! let input = ImageInput::path("ticket.png");
//! let options = DecodeOptions::default().aggressive(true);
//! if let Some(result) = qr_cascade::decode_blocking(&input, &options)? {
//!     println!("{} (pass {:?})", result.text, result.meta.pass_name);
//! }
//! # Ok::<(), qr_cascade::QrError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Decode options
pub mod config;
/// Decode engines (native detector, software decoder)
pub mod engines;
/// Error types
pub mod error;
/// Image loading (files, bytes, base64)
pub mod loader;
/// Core data structures (PixelBuffer, DecodeResult, Point)
pub mod models;
/// Decode orchestration across passes and engines
pub mod orchestrator;
/// Preprocessing pass generation
pub mod pipeline;
/// Dataset and reporting helpers shared by the CLI and benches
pub mod tools;
/// Pixel buffer transforms (grayscale, binarization, filters, alpha)
pub mod utils;
/// Background decode worker
pub mod worker;

pub use config::{ColorHint, DecodeOptions, HintStrategy};
pub use engines::{
    DecodeEngine, NativeEngine, NativeSupport, RqrrDecoder, SoftwareEngine, UnavailableDetector,
};
pub use error::{EngineError, QrError};
pub use loader::{ImageInput, load_pixel_buffer};
pub use models::{BarcodeFormat, DecodeResult, EngineKind, PixelBuffer, Point, ResultMeta};
pub use orchestrator::DecodeOrchestrator;
pub use pipeline::{Pass, PipelineBuilder, build_passes};
pub use worker::{DecodeMode, DecodeRequest, DecodeResponse, DecodeWorker};

use futures::executor::block_on;
use std::sync::{Arc, OnceLock};

/// Orchestrator behind the free functions: no native detector, `rqrr`
/// software engine, process-wide native support slot.
pub fn default_orchestrator() -> &'static Arc<DecodeOrchestrator> {
    static DEFAULT: OnceLock<Arc<DecodeOrchestrator>> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        Arc::new(DecodeOrchestrator::new(
            NativeEngine::with_support(UnavailableDetector, NativeSupport::process_wide()),
            SoftwareEngine::default(),
        ))
    })
}

/// Decode the first QR code in an image
///
/// # Arguments
/// * `input` - File path, encoded bytes or base64 text
/// * `options` - Decode options; `options.worker` moves the work to a
///   background thread
///
/// # Returns
/// The first result, `Ok(None)` when the image holds no readable QR code, or
/// an error when the image could not be loaded
pub async fn decode(
    input: &ImageInput,
    options: &DecodeOptions,
) -> Result<Option<DecodeResult>, QrError> {
    if options.worker {
        let bytes = input.read_bytes()?.into_owned();
        let request = DecodeRequest::new(bytes, options.clone(), DecodeMode::First);
        return DecodeWorker::new(Arc::clone(default_orchestrator()))
            .run(request)
            .await
            .into_single();
    }
    let buffer = load_pixel_buffer(input, options.downscale_max_dim)?;
    Ok(default_orchestrator().decode_first(&buffer, options).await)
}

/// Decode every distinct QR code in an image, on the caller's thread
///
/// # Arguments
/// * `input` - File path, encoded bytes or base64 text
/// * `options` - Decode options
///
/// # Returns
/// Results deduplicated by text, in discovery order
pub async fn decode_all(
    input: &ImageInput,
    options: &DecodeOptions,
) -> Result<Vec<DecodeResult>, QrError> {
    let buffer = load_pixel_buffer(input, options.downscale_max_dim)?;
    Ok(default_orchestrator().decode_all(&buffer, options).await)
}

/// Decode the first QR code in an already loaded buffer
pub async fn decode_from_buffer(
    buffer: &PixelBuffer,
    options: &DecodeOptions,
) -> Option<DecodeResult> {
    default_orchestrator().decode_first(buffer, options).await
}

/// Decode every distinct QR code in an already loaded buffer
pub async fn decode_all_from_buffer(
    buffer: &PixelBuffer,
    options: &DecodeOptions,
) -> Vec<DecodeResult> {
    default_orchestrator().decode_all(buffer, options).await
}

/// Blocking form of [`decode`]
pub fn decode_blocking(
    input: &ImageInput,
    options: &DecodeOptions,
) -> Result<Option<DecodeResult>, QrError> {
    block_on(decode(input, options))
}

/// Blocking form of [`decode_all`]
pub fn decode_all_blocking(
    input: &ImageInput,
    options: &DecodeOptions,
) -> Result<Vec<DecodeResult>, QrError> {
    block_on(decode_all(input, options))
}

/// Blocking form of [`decode_from_buffer`]
pub fn decode_from_buffer_blocking(
    buffer: &PixelBuffer,
    options: &DecodeOptions,
) -> Option<DecodeResult> {
    block_on(decode_from_buffer(buffer, options))
}

/// Blocking form of [`decode_all_from_buffer`]
pub fn decode_all_from_buffer_blocking(
    buffer: &PixelBuffer,
    options: &DecodeOptions,
) -> Vec<DecodeResult> {
    block_on(decode_all_from_buffer(buffer, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_buffer_has_no_qr() {
        let blank = PixelBuffer::filled(32, 32, [255, 255, 255, 255]).unwrap();
        assert!(decode_from_buffer_blocking(&blank, &DecodeOptions::default()).is_none());
        assert!(decode_all_from_buffer_blocking(&blank, &DecodeOptions::default()).is_empty());
    }

    #[test]
    fn test_default_orchestrator_is_shared() {
        assert!(Arc::ptr_eq(default_orchestrator(), default_orchestrator()));
    }

    #[test]
    fn test_bad_input_is_an_error() {
        let input = ImageInput::Bytes(vec![0, 1, 2]);
        assert!(decode_blocking(&input, &DecodeOptions::default()).is_err());
        assert!(decode_blocking(&input, &DecodeOptions::default().worker(false)).is_err());
        assert!(matches!(
            decode_all_blocking(&ImageInput::Bytes(Vec::new()), &DecodeOptions::default()),
            Err(QrError::EmptyInput)
        ));
    }
}
