//! Configuration via `setcode.toml`
//!
//! The index and the decoder are configured from one file with an `[index]`
//! and a `[decode]` section. Missing fields fall back to defaults, and the
//! whole file is validated eagerly on load.

use crate::error::{Error, Result};
use crate::types::{TermId, DEFAULT_PAD_TOKEN};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "setcode.toml";

/// Default end-of-sequence marker
pub const DEFAULT_END_MARKER: TermId = 1;

// ============================================================================
// IndexConfig
// ============================================================================

/// Shape of the corpus the term-set index is built for
///
/// A persisted index is only valid for the exact config it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Number of term ids in the vocabulary
    #[serde(default = "default_vocab_size")]
    pub vocab_size: u32,
    /// Maximum number of non-padding terms per code (L)
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Padding sentinel stripped from corpus codes
    #[serde(default = "default_pad_token_id")]
    pub pad_token_id: TermId,
    /// Decoder start token that may lead each corpus code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_token_id: Option<TermId>,
}

fn default_vocab_size() -> u32 {
    32_128
}

fn default_code_length() -> usize {
    26
}

fn default_pad_token_id() -> TermId {
    DEFAULT_PAD_TOKEN
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            vocab_size: default_vocab_size(),
            code_length: default_code_length(),
            pad_token_id: default_pad_token_id(),
            start_token_id: None,
        }
    }
}

impl IndexConfig {
    /// Config for a vocabulary and code length, other fields default
    pub fn new(vocab_size: u32, code_length: usize) -> Self {
        Self {
            vocab_size,
            code_length,
            ..Self::default()
        }
    }

    /// Set the padding sentinel
    pub fn with_pad_token(mut self, pad: TermId) -> Self {
        self.pad_token_id = pad;
        self
    }

    /// Set the leading start token
    pub fn with_start_token(mut self, start: TermId) -> Self {
        self.start_token_id = Some(start);
        self
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            return Err(Error::InvalidConfig("index.vocab_size must be > 0".into()));
        }
        if self.code_length == 0 {
            return Err(Error::InvalidConfig("index.code_length must be > 0".into()));
        }
        if Some(self.pad_token_id) == self.start_token_id {
            return Err(Error::InvalidConfig(
                "index.pad_token_id and index.start_token_id must differ".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// DecodeConfig
// ============================================================================

/// Per-request decoding parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Maximum number of canonical groups kept after each merge-and-prune step
    #[serde(default = "default_beam_width")]
    pub beam_width: usize,
    /// Code length L; decoding runs at most this many steps
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Term id the oracle emits to end a code early; must not occur in
    /// any corpus code
    #[serde(default = "default_end_marker")]
    pub end_marker_id: TermId,
    /// Hard cap on decoding steps (effective steps = min(code_length, max_steps))
    #[serde(default = "default_code_length")]
    pub max_steps: usize,
    /// Raw orderings kept per group to continue expansion (at least one)
    #[serde(default = "default_retained_orderings")]
    pub retained_orderings: usize,
    /// Legal candidates expanded per hypothesis; defaults to `beam_width`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_per_hypothesis: Option<usize>,
    /// Renormalize oracle log-probabilities over the legal candidates
    #[serde(default)]
    pub renormalize: bool,
    /// Drop candidates whose step log-probability falls below this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam_threshold: Option<f32>,
    /// First step at which `beam_threshold` applies
    #[serde(default)]
    pub threshold_start_step: usize,
    /// First step at which a hypothesis landing on an unextendable code finishes without the end marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_stop_start: Option<usize>,
}

fn default_beam_width() -> usize {
    10
}

fn default_end_marker() -> TermId {
    DEFAULT_END_MARKER
}

fn default_retained_orderings() -> usize {
    2
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            beam_width: default_beam_width(),
            code_length: default_code_length(),
            end_marker_id: default_end_marker(),
            max_steps: default_code_length(),
            retained_orderings: default_retained_orderings(),
            candidates_per_hypothesis: None,
            renormalize: false,
            beam_threshold: None,
            threshold_start_step: 0,
            early_stop_start: None,
        }
    }
}

impl DecodeConfig {
    /// Config with the given beam width and code length; `max_steps` follows `code_length`
    pub fn new(beam_width: usize, code_length: usize) -> Self {
        Self {
            beam_width,
            code_length,
            max_steps: code_length,
            ..Self::default()
        }
    }

    /// Set the end marker
    pub fn with_end_marker(mut self, end_marker_id: TermId) -> Self {
        self.end_marker_id = end_marker_id;
        self
    }

    /// Set the step cap
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set how many raw orderings each group keeps
    pub fn with_retained_orderings(mut self, n: usize) -> Self {
        self.retained_orderings = n;
        self
    }

    /// Set the per-hypothesis candidate cap
    pub fn with_candidates_per_hypothesis(mut self, n: usize) -> Self {
        self.candidates_per_hypothesis = Some(n);
        self
    }

    /// Enable renormalization over legal candidates
    pub fn with_renormalize(mut self, renormalize: bool) -> Self {
        self.renormalize = renormalize;
        self
    }

    /// Enable the step log-probability threshold from `start_step` on
    pub fn with_beam_threshold(mut self, threshold: f32, start_step: usize) -> Self {
        self.beam_threshold = Some(threshold);
        self.threshold_start_step = start_step;
        self
    }

    /// Enable set-level early stop from `start_step` on
    pub fn with_early_stop(mut self, start_step: usize) -> Self {
        self.early_stop_start = Some(start_step);
        self
    }

    /// Number of decoding steps actually run
    pub fn effective_steps(&self) -> usize {
        self.code_length.min(self.max_steps)
    }

    /// Candidate cap with the default applied
    pub fn candidate_cap(&self) -> usize {
        self.candidates_per_hypothesis.unwrap_or(self.beam_width)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.beam_width == 0 {
            return Err(Error::InvalidConfig("decode.beam_width must be > 0".into()));
        }
        if self.code_length == 0 {
            return Err(Error::InvalidConfig("decode.code_length must be > 0".into()));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidConfig("decode.max_steps must be > 0".into()));
        }
        if self.retained_orderings == 0 {
            return Err(Error::InvalidConfig(
                "decode.retained_orderings must be >= 1".into(),
            ));
        }
        if self.candidates_per_hypothesis == Some(0) {
            return Err(Error::InvalidConfig(
                "decode.candidates_per_hypothesis must be > 0".into(),
            ));
        }
        if let Some(t) = self.beam_threshold {
            if t.is_nan() || t > 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "decode.beam_threshold must be a log-probability <= 0, got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SetcodeConfig
// ============================================================================

/// Complete configuration loaded from `setcode.toml`
///
/// # Example
///
/// ```toml
/// [index]
/// vocab_size = 32128
/// code_length = 26
///
/// [decode]
/// beam_width = 10
/// end_marker_id = 1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetcodeConfig {
    /// Index shape
    #[serde(default)]
    pub index: IndexConfig,
    /// Decoding parameters
    #[serde(default)]
    pub decode: DecodeConfig,
}

impl SetcodeConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Setcode configuration

[index]
# Number of term ids in the vocabulary
vocab_size = 32128
# Maximum number of terms per document code
code_length = 26
# Padding sentinel stripped from corpus codes (4294967295 = -1 as u32)
pad_token_id = 4294967295
# start_token_id = 0

[decode]
# Canonical groups kept after each step
beam_width = 10
# Must match index.code_length
code_length = 26
end_marker_id = 1
max_steps = 26
# Raw orderings kept per merged group
retained_orderings = 2
# renormalize = false
# beam_threshold = -10.0
# threshold_start_step = 0
# early_stop_start = 1
"#
    }

    /// Parse and validate config text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SetcodeConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidConfig(msg) => {
                Error::InvalidConfig(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate both sections and their agreement
    pub fn validate(&self) -> Result<()> {
        self.index.validate()?;
        self.decode.validate()?;
        if self.index.code_length != self.decode.code_length {
            return Err(Error::InvalidConfig(format!(
                "decode.code_length ({}) must equal index.code_length ({})",
                self.decode.code_length, self.index.code_length
            )));
        }
        Ok(())
    }
}
