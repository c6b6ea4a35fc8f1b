use serde::{Deserialize, Serialize};

/// Who a segment is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerKind {
    /// The reader's own character. Requires explicit confirmation.
    Protagonist,
    /// Any other named (or unnamed) character.
    Character,
    /// Narration, scene description, chapter titles.
    Narrator,
}

impl SpeakerKind {
    /// Returns the tag string for this kind (e.g., "protagonist").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Protagonist => "protagonist",
            Self::Character => "character",
            Self::Narrator => "narrator",
        }
    }
}

/// One attributed unit of narrative text.
///
/// `sequence` is the zero-based position within a single parse. It is
/// stable inside a session but not globally unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub speaker_kind: SpeakerKind,
    pub speaker_name: String,
    pub content: String,
    pub sequence: usize,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub required_chars_used: Vec<String>,
}

impl Segment {
    pub fn new(
        speaker_kind: SpeakerKind,
        speaker_name: impl Into<String>,
        content: impl Into<String>,
        sequence: usize,
    ) -> Self {
        Self {
            speaker_kind,
            speaker_name: speaker_name.into(),
            content: content.into(),
            sequence,
            is_read: false,
            required_chars_used: Vec::new(),
        }
    }

    pub fn is_protagonist(&self) -> bool {
        self.speaker_kind == SpeakerKind::Protagonist
    }
}
