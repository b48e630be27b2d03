//! Preprocessing pass generation.
//!
//! One source buffer becomes an ordered, bounded list of named [`Pass`]es.
//! The list is produced from an explicit plan:
//!
//! ```text
//! opaque source:       chain(source)
//! transparent source:  flatten-white, flatten-black,
//!                      flatten-black+[luma],
//!                      chain(flatten-white),
//!                      flatten-black+chain(flatten-black)
//!
//! chain = luma -> adaptive-small -> adaptive-medium -> adaptive-large -> denoise [-> hint]
//!         each step feeds the next; every step may be followed by its +invert
//! ```
//!
//! The plan is consumed by a [`PassBudget`], the only place where the pass cap
//! and name uniqueness are enforced. Earlier passes win; once the budget is
//! spent no further transform is computed.

use crate::config::{DecodeOptions, HintStrategy};
use crate::models::PixelBuffer;
use crate::utils::alpha::{
    Background, DEFAULT_ALPHA_THRESHOLD, flatten_transparent, has_transparency,
};
use crate::utils::binarization::{
    Rgb, ThresholdPreset, adaptive_threshold, color_distance_threshold, color_hint_binarize,
};
use crate::utils::filters::{denoise_light, invert};
use crate::utils::grayscale::grayscale;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Substring marking a pass as an inverted variant
pub const INVERT_MARKER: &str = "invert";

const INVERT_SUFFIX: &str = "+invert";
const FLATTEN_BLACK_PREFIX: &str = "flatten-black+";

/// One named, fully materialized buffer offered to the engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    /// Transform chain that produced the buffer, e.g. `flatten-black+luma+invert`
    pub name: String,
    /// The transformed pixels
    pub buffer: PixelBuffer,
}

impl Pass {
    /// Whether the pass is an inverted variant
    pub fn is_inverted(&self) -> bool {
        self.name.contains(INVERT_MARKER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainStep {
    Luma,
    Adaptive(ThresholdPreset),
    Denoise,
    Hint {
        foreground: Rgb,
        background: Rgb,
        strategy: HintStrategy,
    },
}

impl ChainStep {
    fn name(&self) -> String {
        match self {
            ChainStep::Luma => "luma".to_string(),
            ChainStep::Adaptive(preset) => format!("adaptive-{preset}"),
            ChainStep::Denoise => "denoise".to_string(),
            ChainStep::Hint { strategy, .. } => match strategy {
                HintStrategy::LumaMidpoint => "color-hint".to_string(),
                HintStrategy::ColorDistance => "color-distance".to_string(),
            },
        }
    }

    fn apply(&self, buffer: &PixelBuffer) -> PixelBuffer {
        match *self {
            ChainStep::Luma => grayscale(buffer),
            ChainStep::Adaptive(preset) => adaptive_threshold(buffer, preset),
            ChainStep::Denoise => denoise_light(buffer),
            ChainStep::Hint {
                foreground,
                background,
                strategy: HintStrategy::LumaMidpoint,
            } => color_hint_binarize(buffer, Some((foreground, background))),
            ChainStep::Hint {
                foreground,
                background,
                strategy: HintStrategy::ColorDistance,
            } => color_distance_threshold(buffer, foreground, background),
        }
    }
}

/// Buffer a chain starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Source,
    Flattened(Background),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlanStep {
    /// Offer the origin buffer itself
    Emit(Origin),
    /// Run `steps` from `origin`, offering each step's output
    Chain {
        origin: Origin,
        prefix: &'static str,
        steps: Vec<ChainStep>,
    },
}

/// Lazily computed chain starting points
struct Origins<'a> {
    source: &'a PixelBuffer,
    alpha_threshold: u8,
    white: Option<PixelBuffer>,
    black: Option<PixelBuffer>,
}

impl<'a> Origins<'a> {
    fn new(source: &'a PixelBuffer, alpha_threshold: u8) -> Self {
        Self {
            source,
            alpha_threshold,
            white: None,
            black: None,
        }
    }

    fn get(&mut self, origin: Origin) -> &PixelBuffer {
        let (slot, background) = match origin {
            Origin::Source => return self.source,
            Origin::Flattened(Background::White) => (&mut self.white, Background::White),
            Origin::Flattened(Background::Black) => (&mut self.black, Background::Black),
        };
        let (source, threshold) = (self.source, self.alpha_threshold);
        slot.get_or_insert_with(|| flatten_transparent(source, background, threshold))
    }
}

/// Bounded, name-unique pass accumulator
struct PassBudget {
    limit: usize,
    passes: Vec<Pass>,
    seen: HashSet<String>,
}

impl PassBudget {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            passes: Vec::with_capacity(limit.min(32)),
            seen: HashSet::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.passes.len() >= self.limit
    }

    /// Accept a pass unless the budget is spent or the name was already used.
    /// `make` only runs when the pass is accepted.
    fn offer<F>(&mut self, name: String, make: F) -> bool
    where
        F: FnOnce() -> PixelBuffer,
    {
        if self.is_full() || self.seen.contains(&name) {
            return false;
        }
        trace!(pass = %name, index = self.passes.len(), "preprocess pass");
        self.seen.insert(name.clone());
        self.passes.push(Pass {
            name,
            buffer: make(),
        });
        true
    }

    fn into_passes(self) -> Vec<Pass> {
        self.passes
    }
}

/// Builds the preprocessing passes for one decode call
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    max_passes: usize,
    try_invert: bool,
    alpha_threshold: u8,
    chain: Vec<ChainStep>,
}

impl PipelineBuilder {
    /// Builder configured from decode options
    pub fn new(options: &DecodeOptions) -> Self {
        let mut chain = vec![ChainStep::Luma];
        chain.extend(ThresholdPreset::ALL.into_iter().map(ChainStep::Adaptive));
        chain.push(ChainStep::Denoise);
        if let Some(hint) = &options.color_hint {
            if let Some((foreground, background)) = hint.colors() {
                chain.push(ChainStep::Hint {
                    foreground,
                    background,
                    strategy: hint.strategy,
                });
            }
        }

        Self {
            max_passes: options.effective_max_passes(),
            try_invert: options.try_invert,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            chain,
        }
    }

    /// Override the alpha level at or below which a pixel counts as transparent
    pub fn with_alpha_threshold(mut self, threshold: u8) -> Self {
        self.alpha_threshold = threshold;
        self
    }

    /// Pass cap applied by [`build`](Self::build)
    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    fn plan(&self, transparent: bool) -> Vec<PlanStep> {
        if !transparent {
            return vec![PlanStep::Chain {
                origin: Origin::Source,
                prefix: "",
                steps: self.chain.clone(),
            }];
        }

        let white = Origin::Flattened(Background::White);
        let black = Origin::Flattened(Background::Black);
        vec![
            PlanStep::Emit(white),
            PlanStep::Emit(black),
            // light modules on a transparent background: try this early
            PlanStep::Chain {
                origin: black,
                prefix: FLATTEN_BLACK_PREFIX,
                steps: vec![ChainStep::Luma],
            },
            PlanStep::Chain {
                origin: white,
                prefix: "",
                steps: self.chain.clone(),
            },
            PlanStep::Chain {
                origin: black,
                prefix: FLATTEN_BLACK_PREFIX,
                steps: self.chain.clone(),
            },
        ]
    }

    /// Generate the ordered pass list for `source`.
    ///
    /// Never returns more than [`max_passes`](Self::max_passes) passes, and
    /// no two passes share a name.
    pub fn build(&self, source: &PixelBuffer) -> Vec<Pass> {
        let transparent = has_transparency(source, self.alpha_threshold);
        let mut origins = Origins::new(source, self.alpha_threshold);
        let mut budget = PassBudget::new(self.max_passes);

        for step in self.plan(transparent) {
            if budget.is_full() {
                break;
            }
            match step {
                PlanStep::Emit(origin) => {
                    let name = match origin {
                        Origin::Flattened(bg) => format!("flatten-{}", bg.as_str()),
                        Origin::Source => "source".to_string(),
                    };
                    budget.offer(name, || origins.get(origin).clone());
                }
                PlanStep::Chain {
                    origin,
                    prefix,
                    steps,
                } => {
                    let start = origins.get(origin);
                    let mut current: Option<PixelBuffer> = None;
                    for step in steps {
                        if budget.is_full() {
                            break;
                        }
                        let next = step.apply(current.as_ref().unwrap_or(start));
                        let name = format!("{prefix}{}", step.name());
                        budget.offer(name.clone(), || next.clone());
                        if self.try_invert {
                            budget.offer(format!("{name}{INVERT_SUFFIX}"), || invert(&next));
                        }
                        current = Some(next);
                    }
                }
            }
        }

        let passes = budget.into_passes();
        debug!(
            passes = passes.len(),
            budget = self.max_passes,
            transparent,
            "built preprocessing passes"
        );
        passes
    }
}

/// Generate the preprocessing passes for `source` under `options`.
pub fn build_passes(source: &PixelBuffer, options: &DecodeOptions) -> Vec<Pass> {
    PipelineBuilder::new(options).build(source)
}
