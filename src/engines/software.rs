//! Software decode engine
//!
//! Converts the buffer to a luminance plane and hands it to a
//! [`SoftwareDecoder`]. Decoder errors and panics are swallowed.

use super::{Candidate, DecodeEngine};
use crate::error::EngineError;
use crate::models::{DecodeResult, EngineKind, PixelBuffer, Point};
use crate::utils::grayscale::luminance_view;
use rqrr::PreparedImage;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace};

/// A decoder working on an 8-bit luminance plane
pub trait SoftwareDecoder: Send + Sync {
    /// Decode at most one symbol from `luma` (`width * height` bytes,
    /// row-major). `Ok(None)` means nothing was found.
    fn decode_luminance(
        &self,
        luma: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<Candidate>, EngineError>;
}

/// [`SoftwareDecoder`] backed by `rqrr`
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl SoftwareDecoder for RqrrDecoder {
    fn decode_luminance(
        &self,
        luma: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<Candidate>, EngineError> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return Ok(None);
        }
        if luma.len() != w * h {
            return Err(EngineError::Failed(format!(
                "luminance plane has {} bytes, expected {}",
                luma.len(),
                w * h
            )));
        }

        let mut prepared = PreparedImage::prepare_from_greyscale(w, h, |x, y| luma[y * w + x]);
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_, text)) if !text.is_empty() => {
                    let points = grid
                        .bounds
                        .iter()
                        .map(|p| Point::new(p.x as f32, p.y as f32))
                        .collect();
                    return Ok(Some(Candidate::new(text).with_points(points)));
                }
                Ok(_) => {}
                Err(err) => trace!(error = %err, "grid rejected"),
            }
        }
        Ok(None)
    }
}

/// Engine running a [`SoftwareDecoder`] on the caller's thread
#[derive(Debug, Clone, Default)]
pub struct SoftwareEngine<S = RqrrDecoder> {
    decoder: S,
}

impl<S: SoftwareDecoder> SoftwareEngine<S> {
    /// Wrap a decoder
    pub fn new(decoder: S) -> Self {
        Self { decoder }
    }

    /// The wrapped decoder
    pub fn decoder(&self) -> &S {
        &self.decoder
    }

    /// Synchronous decode; the async [`DecodeEngine::decode`] resolves to this.
    pub fn decode_sync(&self, buffer: &PixelBuffer) -> Option<DecodeResult> {
        let luma = luminance_view(buffer);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.decoder
                .decode_luminance(&luma, buffer.width(), buffer.height())
        }));
        match outcome {
            Ok(Ok(candidate)) => candidate.and_then(|c| c.into_result(EngineKind::Software)),
            Ok(Err(err)) => {
                trace!(error = %err, "software decode failed");
                None
            }
            Err(_) => {
                debug!("software decoder panicked");
                None
            }
        }
    }
}

impl<S: SoftwareDecoder> DecodeEngine for SoftwareEngine<S> {
    fn kind(&self) -> EngineKind {
        EngineKind::Software
    }

    fn decode(&self, buffer: &PixelBuffer) -> impl Future<Output = Option<DecodeResult>> + Send {
        std::future::ready(self.decode_sync(buffer))
    }
}
