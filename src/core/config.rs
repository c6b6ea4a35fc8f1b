/// Classifier configuration — markers, quote glyphs and naming constants.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// An opening/closing quotation glyph pair. Both may be the same glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePair {
    pub open: char,
    pub close: char,
}

impl QuotePair {
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }
}

/// Lexical constants used by the segment classifier.
///
/// Every field has a default, so a RON file only needs to list what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Label that opens a narration line in the marker grammar.
    pub narration_label: String,
    /// Label that opens a protagonist line in the marker grammar.
    pub protagonist_label: String,
    /// Colon-like separators between a label or speaker name and the line.
    pub separators: Vec<char>,
    pub narrator_name: String,
    pub protagonist_name: String,
    /// Speaker name for quoted speech the heuristics cannot attribute.
    pub unknown_name: String,
    /// Speaker name for quoted lines in the fallback segmentation.
    pub fallback_unknown_name: String,
    pub quote_pairs: Vec<QuotePair>,
    /// Characters inspected on each side of a quoted span.
    pub context_window: usize,
    /// Longest accepted speaker name in the marker grammar, in code points.
    pub max_speaker_name_len: usize,
    /// Names that refer to the protagonist when followed by a speech verb.
    pub protagonist_aliases: Vec<String>,
    /// Captured names that must never become a character's speaker name.
    pub excluded_speaker_names: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            narration_label: "正文".to_string(),
            protagonist_label: "主角".to_string(),
            separators: vec!['：', ':'],
            narrator_name: "旁白".to_string(),
            protagonist_name: "主角".to_string(),
            unknown_name: "未知角色".to_string(),
            fallback_unknown_name: "未知".to_string(),
            quote_pairs: vec![
                QuotePair::new('“', '”'),
                QuotePair::new('「', '」'),
                QuotePair::new('"', '"'),
            ],
            context_window: 20,
            max_speaker_name_len: 20,
            protagonist_aliases: Vec::new(),
            excluded_speaker_names: vec![
                "我".to_string(),
                "我们".to_string(),
                "主角".to_string(),
            ],
        }
    }
}

impl ClassifierConfig {
    /// Load a configuration from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<ClassifierConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a configuration from a RON string.
    pub fn parse_ron(input: &str) -> Result<ClassifierConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// Every literal string that opens a narration or protagonist line.
    pub fn markers(&self) -> Vec<String> {
        let mut markers = Vec::with_capacity(self.separators.len() * 2);
        for label in [&self.narration_label, &self.protagonist_label] {
            for sep in &self.separators {
                markers.push(format!("{label}{sep}"));
            }
        }
        markers
    }

    /// True if any quotation glyph (opening or closing) occurs in `text`.
    pub fn has_quote_glyph(&self, text: &str) -> bool {
        text.chars().any(|c| {
            self.quote_pairs
                .iter()
                .any(|pair| pair.open == c || pair.close == c)
        })
    }

    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.excluded_speaker_names.iter().any(|n| n == name)
    }
}
