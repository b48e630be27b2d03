//! Background decode worker.
//!
//! A [`DecodeRequest`] (encoded image bytes, options, mode) goes in and a
//! [`DecodeResponse`] comes out. Each request runs on its own named thread
//! and the reply travels back over a one-shot channel. When the thread cannot
//! be spawned, or dies before replying, the request runs on the caller's
//! thread instead.

use crate::config::DecodeOptions;
use crate::engines::DecodeEngine;
use crate::error::QrError;
use crate::loader::pixel_buffer_from_bytes;
use crate::models::DecodeResult;
use crate::orchestrator::DecodeOrchestrator;
use futures::channel::oneshot;
use futures::executor::block_on;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

const WORKER_THREAD_NAME: &str = "qr-decode-worker";

/// Which orchestrator operation a request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Stop at the first result
    #[default]
    First,
    /// Collect every distinct result
    All,
}

/// Message sent to the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeRequest {
    /// Encoded image (PNG, JPEG, ...)
    pub bytes: Vec<u8>,
    /// Options for the decode
    #[serde(default)]
    pub options: DecodeOptions,
    /// Operation to run
    #[serde(default)]
    pub mode: DecodeMode,
}

impl DecodeRequest {
    /// Build a request
    pub fn new(bytes: Vec<u8>, options: DecodeOptions, mode: DecodeMode) -> Self {
        Self { bytes, options, mode }
    }

    /// Load the image and run the requested operation.
    ///
    /// Loading failures become [`DecodeResponse::Error`].
    pub async fn process<N, S>(&self, orchestrator: &DecodeOrchestrator<N, S>) -> DecodeResponse
    where
        N: DecodeEngine,
        S: DecodeEngine,
    {
        let buffer = match pixel_buffer_from_bytes(&self.bytes, self.options.downscale_max_dim) {
            Ok(buffer) => buffer,
            Err(err) => {
                return DecodeResponse::Error {
                    message: err.to_string(),
                };
            }
        };
        match self.mode {
            DecodeMode::First => DecodeResponse::Single {
                result: orchestrator.decode_first(&buffer, &self.options).await,
            },
            DecodeMode::All => DecodeResponse::Multiple {
                results: orchestrator.decode_all(&buffer, &self.options).await,
            },
        }
    }
}

/// Message sent back by the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DecodeResponse {
    /// Outcome of [`DecodeMode::First`]
    Single {
        /// The result, if any
        result: Option<DecodeResult>,
    },
    /// Outcome of [`DecodeMode::All`]
    Multiple {
        /// Distinct results in traversal order
        results: Vec<DecodeResult>,
    },
    /// The request failed before decoding started
    Error {
        /// Human readable reason
        message: String,
    },
}

impl DecodeResponse {
    /// Unwrap a single-mode reply. A multi-mode reply yields its first result.
    pub fn into_single(self) -> Result<Option<DecodeResult>, QrError> {
        match self {
            DecodeResponse::Single { result } => Ok(result),
            DecodeResponse::Multiple { results } => Ok(results.into_iter().next()),
            DecodeResponse::Error { message } => Err(QrError::Worker(message)),
        }
    }

    /// Unwrap a multi-mode reply. A single-mode reply yields zero or one result.
    pub fn into_multiple(self) -> Result<Vec<DecodeResult>, QrError> {
        match self {
            DecodeResponse::Single { result } => Ok(result.into_iter().collect()),
            DecodeResponse::Multiple { results } => Ok(results),
            DecodeResponse::Error { message } => Err(QrError::Worker(message)),
        }
    }
}

/// Runs decode requests off the caller's thread
#[derive(Debug)]
pub struct DecodeWorker<N, S> {
    orchestrator: Arc<DecodeOrchestrator<N, S>>,
}

impl<N, S> Clone for DecodeWorker<N, S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

impl<N, S> DecodeWorker<N, S>
where
    N: DecodeEngine + 'static,
    S: DecodeEngine + 'static,
{
    /// Worker sharing `orchestrator`
    pub fn new(orchestrator: Arc<DecodeOrchestrator<N, S>>) -> Self {
        Self { orchestrator }
    }

    /// Run `request` on a worker thread, falling back to the current thread.
    pub async fn run(&self, request: DecodeRequest) -> DecodeResponse {
        let request = Arc::new(request);
        let (tx, rx) = oneshot::channel();
        let job = Arc::clone(&request);
        let orchestrator = Arc::clone(&self.orchestrator);

        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let response = block_on(job.process(&orchestrator));
                // receiver gone means the caller stopped waiting
                let _ = tx.send(response);
            });

        match spawned {
            Ok(_) => match rx.await {
                Ok(response) => {
                    debug!(mode = ?request.mode, "worker replied");
                    return response;
                }
                Err(oneshot::Canceled) => {
                    warn!("decode worker exited without replying; decoding on caller thread");
                }
            },
            Err(err) => {
                warn!(error = %err, "failed to spawn decode worker; decoding on caller thread");
            }
        }

        request.process(&self.orchestrator).await
    }

    /// [`run`](Self::run) driven to completion on the current thread.
    pub fn run_blocking(&self, request: DecodeRequest) -> DecodeResponse {
        block_on(self.run(request))
    }
}
