//! Decode options.
//!
//! [`DecodeOptions`] is read by the pipeline builder and the orchestrator but
//! never mutated by them. It is serde-serializable (camelCase keys) so it can
//! cross the worker boundary or be loaded from JSON.

use crate::utils::binarization::Rgb;
use serde::{Deserialize, Serialize};

/// Pass budget when nothing else is configured
pub const DEFAULT_MAX_PASSES: usize = 6;
/// Pass budget in aggressive mode
pub const AGGRESSIVE_MAX_PASSES: usize = 12;
/// Longest side an input image is downscaled to before decoding
pub const DEFAULT_DOWNSCALE_MAX_DIM: u32 = 1400;

/// Which binarizer the colour-hint pass uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HintStrategy {
    /// Threshold at the midpoint of the two hint lumas
    #[default]
    LumaMidpoint,
    /// Nearest of the two hint colours in RGB space
    ColorDistance,
}

/// Expected symbol colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorHint {
    /// Colour of the dark modules
    pub foreground: Option<Rgb>,
    /// Colour of the light modules and quiet zone
    pub background: Option<Rgb>,
    /// Binarizer used for the hint pass
    pub strategy: HintStrategy,
}

impl ColorHint {
    /// Hint with both colours and the default strategy
    pub fn new(foreground: Rgb, background: Rgb) -> Self {
        Self {
            foreground: Some(foreground),
            background: Some(background),
            strategy: HintStrategy::LumaMidpoint,
        }
    }

    /// Switch the binarizer
    pub fn with_strategy(mut self, strategy: HintStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Both colours, if the hint is complete. A partial hint adds no pass.
    pub fn colors(&self) -> Option<(Rgb, Rgb)> {
        Some((self.foreground?, self.background?))
    }
}

/// Options for one decode call
///
/// Values are not validated; nonsensical settings such as `max_passes = 0`
/// simply produce no preprocessing passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecodeOptions {
    /// Raise the pass budget to [`AGGRESSIVE_MAX_PASSES`]
    pub aggressive: bool,
    /// Hard cap on generated passes when not aggressive
    pub max_passes: usize,
    /// Longest side the image loader downscales to
    pub downscale_max_dim: u32,
    /// Append an inverted variant after each chain step
    pub try_invert: bool,
    /// Optional expected colours
    pub color_hint: Option<ColorHint>,
    /// Run file/bytes decodes on a worker thread
    pub worker: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            aggressive: false,
            max_passes: DEFAULT_MAX_PASSES,
            downscale_max_dim: DEFAULT_DOWNSCALE_MAX_DIM,
            try_invert: true,
            color_hint: None,
            worker: true,
        }
    }
}

impl DecodeOptions {
    /// Options with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Pass budget actually applied by the pipeline builder
    pub fn effective_max_passes(&self) -> usize {
        if self.aggressive {
            AGGRESSIVE_MAX_PASSES
        } else {
            self.max_passes
        }
    }

    /// Set aggressive mode
    pub fn aggressive(mut self, aggressive: bool) -> Self {
        self.aggressive = aggressive;
        self
    }

    /// Set the pass cap
    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set the loader downscale target
    pub fn downscale_max_dim(mut self, max_dim: u32) -> Self {
        self.downscale_max_dim = max_dim;
        self
    }

    /// Enable or disable inverted variants
    pub fn try_invert(mut self, try_invert: bool) -> Self {
        self.try_invert = try_invert;
        self
    }

    /// Set the colour hint
    pub fn color_hint(mut self, hint: ColorHint) -> Self {
        self.color_hint = Some(hint);
        self
    }

    /// Enable or disable the worker thread
    pub fn worker(mut self, worker: bool) -> Self {
        self.worker = worker;
        self
    }
}
