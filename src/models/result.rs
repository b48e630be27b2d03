use super::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbology of a decoded result. Only QR is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BarcodeFormat {
    /// QR Code (Model 2)
    #[default]
    #[serde(rename = "QR_CODE")]
    QrCode,
}

/// Which engine produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Platform detector, possibly hardware accelerated
    Native,
    /// Pure software decoder working on luminance data
    Software,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Native => f.write_str("native"),
            EngineKind::Software => f.write_str("software"),
        }
    }
}

/// Provenance of a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMeta {
    /// Engine that decoded the symbol
    pub engine: EngineKind,
    /// Whether the winning pass was an inverted variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverted_flag: Option<bool>,
    /// Name of the preprocessing pass; absent for the unmodified source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_name: Option<String>,
}

/// A decoded QR symbol
///
/// `text` is never empty. `points`, when present, outline the symbol in the
/// coordinate space of the pass buffer it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    /// Decoded payload
    pub text: String,
    /// Always [`BarcodeFormat::QrCode`]
    pub format: BarcodeFormat,
    /// Corner points, in engine order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    /// Provenance
    pub meta: ResultMeta,
}

impl DecodeResult {
    /// Bare result as reported by an engine, before the orchestrator attaches
    /// pass provenance. Returns `None` for empty text.
    pub fn from_engine(
        engine: EngineKind,
        text: String,
        points: Option<Vec<Point>>,
    ) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text,
            format: BarcodeFormat::QrCode,
            points: points.filter(|p| !p.is_empty()),
            meta: ResultMeta {
                engine,
                inverted_flag: None,
                pass_name: None,
            },
        })
    }

    /// Attach the name of the pass the result came from.
    pub(crate) fn with_pass(mut self, pass_name: &str) -> Self {
        self.meta.inverted_flag = Some(pass_name.contains(crate::pipeline::INVERT_MARKER));
        self.meta.pass_name = Some(pass_name.to_string());
        self
    }
}
