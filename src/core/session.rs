/// Reading session — one reader's cursor over a fixed segment sequence.
///
/// Narration and other characters' lines may be advanced past freely.
/// Protagonist lines hold the cursor until the reader confirms them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::vocabulary::{self, UsageReport};
use crate::schema::history::HistoryEntry;
use crate::schema::segment::{Segment, SpeakerKind};
use crate::schema::session_id::SessionId;
use crate::schema::view::{progress_percentage, Cue, DialogueView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("nothing to confirm")]
    NotAwaitingConfirmation,
    #[error("sequence complete")]
    SequenceComplete,
    #[error("protagonist line must be confirmed, not advanced")]
    ConfirmationRequired,
}

/// Coarse state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    AwaitingConfirmation,
    AutoReady,
    Completed,
}

/// Which segments a vocabulary analysis looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisScope {
    /// The whole sequence.
    All,
    /// Only segments the reader has already passed.
    Read,
}

/// Counts describing a session's segments and progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total: usize,
    pub completed: usize,
    pub progress_percentage: f64,
    pub protagonist_segments: usize,
    pub character_segments: usize,
    pub narrator_segments: usize,
    pub confirmed_protagonist_segments: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSession {
    id: SessionId,
    segments: Vec<Segment>,
    current_index: usize,
    waiting_for_confirmation: bool,
    history: Vec<HistoryEntry>,
    /// Reject `advance` on protagonist lines.
    strict: bool,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl ReadingSession {
    pub fn new(id: SessionId, segments: Vec<Segment>) -> Self {
        let now = Utc::now();
        let waiting_for_confirmation = segments.first().is_some_and(Segment::is_protagonist);
        Self {
            id,
            segments,
            current_index: 0,
            waiting_for_confirmation,
            history: Vec::new(),
            strict: true,
            created_at: now,
            last_activity: now,
        }
    }

    /// Allow or forbid `advance` past a protagonist line.
    pub fn with_strict_confirmation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_waiting_for_confirmation(&self) -> bool {
        self.waiting_for_confirmation
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn total_count(&self) -> usize {
        self.segments.len()
    }

    pub fn completed_count(&self) -> usize {
        self.current_index
    }

    pub fn progress_percentage(&self) -> f64 {
        progress_percentage(self.completed_count(), self.total_count())
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.segments.len()
    }

    pub fn state(&self) -> SessionState {
        if self.is_complete() {
            SessionState::Completed
        } else if self.waiting_for_confirmation {
            SessionState::AwaitingConfirmation
        } else if self.current_index == 0 && self.history.is_empty() {
            SessionState::NotStarted
        } else {
            SessionState::AutoReady
        }
    }

    /// The current segment with its cue. Does not move the cursor.
    ///
    /// Repeated calls without an intervening `advance`/`confirm` return
    /// identical views.
    pub fn peek(&mut self) -> DialogueView {
        let Some(segment) = self.segments.get(self.current_index) else {
            self.waiting_for_confirmation = false;
            return self.view(None, Cue::End);
        };

        let cue = match segment.speaker_kind {
            SpeakerKind::Protagonist => Cue::RequiresConfirmation,
            SpeakerKind::Character | SpeakerKind::Narrator => Cue::AutoAdvance,
        };
        self.waiting_for_confirmation = cue == Cue::RequiresConfirmation;
        let segment = segment.clone();
        self.view(Some(segment), cue)
    }

    /// Move past the current segment and peek at the next one.
    pub fn advance(&mut self) -> Result<DialogueView, TransitionError> {
        let segment = self
            .segments
            .get(self.current_index)
            .ok_or(TransitionError::SequenceComplete)?;
        if self.strict && segment.is_protagonist() {
            return Err(TransitionError::ConfirmationRequired);
        }
        Ok(self.step())
    }

    /// Acknowledge the current protagonist line and peek at the next one.
    pub fn confirm(&mut self) -> Result<DialogueView, TransitionError> {
        if self.is_complete() {
            return Err(TransitionError::SequenceComplete);
        }
        if !self.waiting_for_confirmation {
            return Err(TransitionError::NotAwaitingConfirmation);
        }
        self.segments[self.current_index].is_read = true;
        Ok(self.step())
    }

    /// Record the current segment, move the cursor by one, then peek.
    fn step(&mut self) -> DialogueView {
        let now = Utc::now();
        self.history
            .push(HistoryEntry::record(&self.segments[self.current_index], now));
        self.current_index += 1;
        self.waiting_for_confirmation = false;
        self.last_activity = now;

        if self.is_complete() {
            log::info!("session {} completed ({} segments)", self.id, self.total_count());
        }
        self.peek()
    }

    /// The most recent `limit` history entries, oldest first. A `limit` of
    /// zero or less returns everything.
    pub fn recent_history(&self, limit: i64) -> &[HistoryEntry] {
        match usize::try_from(limit) {
            Ok(n) if n > 0 && n < self.history.len() => &self.history[self.history.len() - n..],
            _ => &self.history,
        }
    }

    /// Required-vocabulary analysis over this session's segments. Results
    /// are written onto the session's protagonist segments.
    pub fn analyze<S: AsRef<str>>(
        &mut self,
        required_tokens: &[S],
        scope: AnalysisScope,
    ) -> UsageReport {
        let end = match scope {
            AnalysisScope::All => self.segments.len(),
            AnalysisScope::Read => self.current_index,
        };
        vocabulary::analyze(&mut self.segments[..end], required_tokens)
    }

    pub fn stats(&self) -> SessionStats {
        let count = |kind: SpeakerKind| {
            self.segments
                .iter()
                .filter(|s| s.speaker_kind == kind)
                .count()
        };
        SessionStats {
            total: self.total_count(),
            completed: self.completed_count(),
            progress_percentage: self.progress_percentage(),
            protagonist_segments: count(SpeakerKind::Protagonist),
            character_segments: count(SpeakerKind::Character),
            narrator_segments: count(SpeakerKind::Narrator),
            confirmed_protagonist_segments: self
                .segments
                .iter()
                .filter(|s| s.is_protagonist() && s.is_read)
                .count(),
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }

    fn view(&self, segment: Option<Segment>, cue: Cue) -> DialogueView {
        let is_end = segment.is_none();
        DialogueView {
            segment,
            cue,
            waiting_for_confirmation: self.waiting_for_confirmation,
            progress_percentage: self.progress_percentage(),
            total: self.total_count(),
            completed: self.completed_count(),
            can_continue: !is_end,
            is_end,
        }
    }
}
