//! Decode orchestration.
//!
//! Precedence is fixed: the native engine on the untouched source, then for
//! every preprocessing pass the native engine followed by the software engine.
//! Everything runs sequentially; the only suspension point is the native
//! engine.

use crate::config::DecodeOptions;
use crate::engines::{DecodeEngine, NativeEngine, RqrrDecoder, SoftwareEngine, UnavailableDetector};
use crate::models::{DecodeResult, PixelBuffer};
use crate::pipeline::PipelineBuilder;
use futures::executor::block_on;
use std::collections::HashSet;
use tracing::debug;

/// Runs preprocessing passes through a native and a software engine
#[derive(Debug, Clone, Default)]
pub struct DecodeOrchestrator<
    N = NativeEngine<UnavailableDetector>,
    S = SoftwareEngine<RqrrDecoder>,
> {
    native: N,
    software: S,
}

impl<N: DecodeEngine, S: DecodeEngine> DecodeOrchestrator<N, S> {
    /// Orchestrator over the given engines
    pub fn new(native: N, software: S) -> Self {
        Self { native, software }
    }

    /// The engine tried first on every buffer
    pub fn native(&self) -> &N {
        &self.native
    }

    /// The engine tried when the native one finds nothing
    pub fn software(&self) -> &S {
        &self.software
    }

    /// Decode the first QR symbol found.
    ///
    /// Returns `None` when no pass yields a result; that is the normal outcome
    /// for images without a readable symbol.
    pub async fn decode_first(
        &self,
        source: &PixelBuffer,
        options: &DecodeOptions,
    ) -> Option<DecodeResult> {
        if let Some(result) = self.native.decode(source).await {
            debug!(engine = %result.meta.engine, "decoded unmodified source");
            return Some(result);
        }

        let passes = PipelineBuilder::new(options).build(source);
        for pass in &passes {
            if let Some(result) = self.native.decode(&pass.buffer).await {
                debug!(engine = %result.meta.engine, pass = %pass.name, "decoded");
                return Some(result.with_pass(&pass.name));
            }
            if let Some(result) = self.software.decode(&pass.buffer).await {
                debug!(engine = %result.meta.engine, pass = %pass.name, "decoded");
                return Some(result.with_pass(&pass.name));
            }
        }

        debug!(passes = passes.len(), "no QR code found");
        None
    }

    /// Decode every distinct QR payload found across all passes.
    ///
    /// Both engines run on every pass. Results are deduplicated by text; the
    /// first occurrence in traversal order wins.
    pub async fn decode_all(
        &self,
        source: &PixelBuffer,
        options: &DecodeOptions,
    ) -> Vec<DecodeResult> {
        let mut collector = Collector::default();
        collector.offer(self.native.decode(source).await);

        let passes = PipelineBuilder::new(options).build(source);
        for pass in &passes {
            let native = self.native.decode(&pass.buffer).await;
            collector.offer(native.map(|r| r.with_pass(&pass.name)));
            let software = self.software.decode(&pass.buffer).await;
            collector.offer(software.map(|r| r.with_pass(&pass.name)));
        }

        let results = collector.results;
        debug!(passes = passes.len(), found = results.len(), "decode_all finished");
        results
    }

    /// [`decode_first`](Self::decode_first) driven to completion on the
    /// current thread.
    pub fn decode_first_blocking(
        &self,
        source: &PixelBuffer,
        options: &DecodeOptions,
    ) -> Option<DecodeResult> {
        block_on(self.decode_first(source, options))
    }

    /// [`decode_all`](Self::decode_all) driven to completion on the current
    /// thread.
    pub fn decode_all_blocking(
        &self,
        source: &PixelBuffer,
        options: &DecodeOptions,
    ) -> Vec<DecodeResult> {
        block_on(self.decode_all(source, options))
    }
}

#[derive(Default)]
struct Collector {
    seen: HashSet<String>,
    results: Vec<DecodeResult>,
}

impl Collector {
    fn offer(&mut self, result: Option<DecodeResult>) {
        if let Some(result) = result {
            if self.seen.insert(result.text.clone()) {
                self.results.push(result);
            }
        }
    }
}
