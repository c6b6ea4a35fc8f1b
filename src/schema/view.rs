use serde::{Deserialize, Serialize};

use super::segment::Segment;

/// What the caller is expected to do with the current segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Protagonist line: the reader must confirm it.
    RequiresConfirmation,
    /// Narration or another character: the caller may advance after rendering.
    AutoAdvance,
    /// No further content.
    End,
}

/// The reader-facing state of a session at its current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueView {
    pub segment: Option<Segment>,
    pub cue: Cue,
    pub waiting_for_confirmation: bool,
    pub progress_percentage: f64,
    pub total: usize,
    pub completed: usize,
    pub can_continue: bool,
    pub is_end: bool,
}

/// Completion percentage, 0 for an empty sequence.
pub fn progress_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}
