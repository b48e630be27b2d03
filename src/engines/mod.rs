//! Decode engines.
//!
//! An engine turns one [`PixelBuffer`] into at most one [`DecodeResult`].
//! Engines never fail outward: unsupported platforms, decoder errors and
//! panics inside a decoder all come back as `None`.
//!
//! Two implementations ship with the crate:
//!
//! - [`NativeEngine`] wraps a platform [`NativeDetector`] and probes its
//!   support once.
//! - [`SoftwareEngine`] feeds a luminance view to a [`SoftwareDecoder`],
//!   by default [`RqrrDecoder`].

pub mod native;
pub mod software;

pub use native::{
    NativeCapabilities, NativeDetector, NativeEngine, NativeSupport, UnavailableDetector,
};
pub use software::{RqrrDecoder, SoftwareDecoder, SoftwareEngine};

use crate::models::{DecodeResult, EngineKind, PixelBuffer, Point};
use std::future::Future;

/// A symbol as reported by an engine collaborator, before provenance is
/// attached
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Decoded payload
    pub text: String,
    /// Corner points, if the collaborator reports them
    pub points: Option<Vec<Point>>,
}

impl Candidate {
    /// Candidate without corner points
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            points: None,
        }
    }

    /// Attach corner points
    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }

    pub(crate) fn into_result(self, engine: EngineKind) -> Option<DecodeResult> {
        DecodeResult::from_engine(engine, self.text, self.points)
    }
}

/// Common interface of the decode engines
///
/// `decode` is asynchronous so platform detectors can suspend; it resolves to
/// `None` whenever nothing usable was found, including on internal failure.
pub trait DecodeEngine: Send + Sync {
    /// Which engine this is, recorded in result metadata
    fn kind(&self) -> EngineKind;

    /// Try to decode a single QR symbol from `buffer`.
    fn decode(&self, buffer: &PixelBuffer) -> impl Future<Output = Option<DecodeResult>> + Send;
}
