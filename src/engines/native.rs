//! Platform detector engine
//!
//! Whether the platform detector supports QR is asked once per
//! [`NativeSupport`] slot. Concurrent callers wait on the same probe, and a
//! failed probe is cached as "unsupported".

use super::{Candidate, DecodeEngine};
use crate::error::EngineError;
use crate::models::{DecodeResult, EngineKind, PixelBuffer};
use futures::FutureExt;
use futures::lock::Mutex;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// What a platform detector reports about itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeCapabilities {
    /// QR is among the supported formats
    pub qr_code: bool,
}

/// A platform barcode detector
pub trait NativeDetector: Send + Sync {
    /// Report the formats the detector supports.
    fn probe(&self) -> impl Future<Output = Result<NativeCapabilities, EngineError>> + Send;

    /// Detect symbols in `buffer`, in detector order.
    fn detect(
        &self,
        buffer: &PixelBuffer,
    ) -> impl Future<Output = Result<Vec<Candidate>, EngineError>> + Send;
}

/// Detector for platforms without a native barcode API
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableDetector;

impl NativeDetector for UnavailableDetector {
    fn probe(&self) -> impl Future<Output = Result<NativeCapabilities, EngineError>> + Send {
        std::future::ready(Err(EngineError::Unsupported))
    }

    fn detect(
        &self,
        _buffer: &PixelBuffer,
    ) -> impl Future<Output = Result<Vec<Candidate>, EngineError>> + Send {
        std::future::ready(Err(EngineError::Unsupported))
    }
}

/// Cached answer to "does the native detector support QR?"
pub struct NativeSupport {
    state: Mutex<Option<bool>>,
}

impl fmt::Debug for NativeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSupport")
            .field("cached", &self.cached())
            .finish()
    }
}

impl Default for NativeSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeSupport {
    /// Empty slot; the first decode probes
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// The slot shared by every engine in the process that asks for it
    pub fn process_wide() -> Arc<NativeSupport> {
        static SHARED: OnceLock<Arc<NativeSupport>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(NativeSupport::new())))
    }

    /// Slot with a known answer; no probe will run
    pub fn resolved(supported: bool) -> Self {
        Self {
            state: Mutex::new(Some(supported)),
        }
    }

    /// The cached answer, if a probe has completed and no one holds the slot
    pub fn cached(&self) -> Option<bool> {
        self.state.try_lock().and_then(|state| *state)
    }

    async fn resolve<D: NativeDetector>(&self, detector: &D) -> bool {
        let mut state = self.state.lock().await;
        if let Some(supported) = *state {
            return supported;
        }
        let supported = match AssertUnwindSafe(detector.probe()).catch_unwind().await {
            Ok(Ok(caps)) => caps.qr_code,
            Ok(Err(err)) => {
                debug!(error = %err, "native detector probe failed");
                false
            }
            Err(_) => {
                debug!("native detector probe panicked");
                false
            }
        };
        debug!(supported, "native detector probed");
        *state = Some(supported);
        supported
    }
}

/// Engine backed by a platform [`NativeDetector`]
#[derive(Debug)]
pub struct NativeEngine<D> {
    detector: D,
    support: Arc<NativeSupport>,
}

impl<D: NativeDetector> NativeEngine<D> {
    /// Engine with its own support slot
    pub fn new(detector: D) -> Self {
        Self::with_support(detector, Arc::new(NativeSupport::new()))
    }

    /// Engine sharing `support` with other engines
    pub fn with_support(detector: D, support: Arc<NativeSupport>) -> Self {
        Self { detector, support }
    }

    /// The support slot this engine reads
    pub fn support(&self) -> &Arc<NativeSupport> {
        &self.support
    }

    /// The wrapped detector
    pub fn detector(&self) -> &D {
        &self.detector
    }
}

impl<D: NativeDetector + Clone> Clone for NativeEngine<D> {
    fn clone(&self) -> Self {
        Self {
            detector: self.detector.clone(),
            support: Arc::clone(&self.support),
        }
    }
}

impl Default for NativeEngine<UnavailableDetector> {
    fn default() -> Self {
        Self::with_support(UnavailableDetector, Arc::new(NativeSupport::resolved(false)))
    }
}

impl<D: NativeDetector> DecodeEngine for NativeEngine<D> {
    fn kind(&self) -> EngineKind {
        EngineKind::Native
    }

    async fn decode(&self, buffer: &PixelBuffer) -> Option<DecodeResult> {
        if !self.support.resolve(&self.detector).await {
            return None;
        }
        match AssertUnwindSafe(self.detector.detect(buffer)).catch_unwind().await {
            Ok(Ok(candidates)) => candidates
                .into_iter()
                .next()
                .and_then(|c: Candidate| c.into_result(EngineKind::Native)),
            Ok(Err(err)) => {
                trace!(error = %err, "native detect failed");
                None
            }
            Err(_) => {
                debug!("native detector panicked");
                None
            }
        }
    }
}
