/// The dialogue reader: chapter text → segments → reading sessions.
///
/// Wires together the classifier, the session state machine, vocabulary
/// analysis and a session store behind id-keyed operations.

use std::path::Path;
use thiserror::Error;

use crate::core::classifier::Classifier;
use crate::core::config::{ClassifierConfig, ConfigError};
use crate::core::session::{AnalysisScope, ReadingSession, SessionStats, TransitionError};
use crate::core::store::{MemoryStore, SessionStore};
use crate::core::vocabulary::{self, UsageReport};
use crate::schema::history::HistoryEntry;
use crate::schema::segment::Segment;
use crate::schema::session_id::SessionId;
use crate::schema::view::DialogueView;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("invalid transition: {0}")]
    Transition(#[from] TransitionError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Broad error category callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    SessionNotFound,
    InvalidTransition,
}

impl ReaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionNotFound(_) => ErrorKind::SessionNotFound,
            Self::Transition(_) => ErrorKind::InvalidTransition,
            Self::Config(_) => ErrorKind::InvalidInput,
        }
    }

    /// Stable machine-readable code, e.g. `"SESSION_NOT_FOUND"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::Transition(TransitionError::NotAwaitingConfirmation) => {
                "NOT_AWAITING_CONFIRMATION"
            }
            Self::Transition(TransitionError::SequenceComplete) => "SEQUENCE_COMPLETE",
            Self::Transition(TransitionError::ConfirmationRequired) => "INVALID_TRANSITION",
            Self::Config(_) => "INVALID_INPUT",
        }
    }
}

/// The top-level reader. Built via `DialogueReader::builder()`.
pub struct DialogueReader<S: SessionStore = MemoryStore> {
    classifier: Classifier,
    store: S,
    strict_confirmation: bool,
}

/// Builder for constructing a `DialogueReader`.
pub struct DialogueReaderBuilder<S> {
    config_path: Option<String>,
    /// Directly provided config (for use without files).
    config: Option<ClassifierConfig>,
    store: S,
    strict_confirmation: bool,
}

impl DialogueReader<MemoryStore> {
    pub fn builder() -> DialogueReaderBuilder<MemoryStore> {
        DialogueReaderBuilder {
            config_path: None,
            config: None,
            store: MemoryStore::new(),
            strict_confirmation: true,
        }
    }
}

impl<S: SessionStore> DialogueReader<S> {
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn classify(&self, text: &str) -> Vec<Segment> {
        self.classifier.classify(text)
    }

    /// Start a session over `segments` and return its id and first view.
    pub fn create_session(&self, segments: Vec<Segment>) -> (SessionId, DialogueView) {
        let id = SessionId::generate();
        let mut session = ReadingSession::new(id.clone(), segments)
            .with_strict_confirmation(self.strict_confirmation);
        let view = session.peek();
        log::info!("created session {} over {} segments", id, session.total_count());
        self.store.put(session);
        (id, view)
    }

    /// Classify a chapter and start a session over the result.
    pub fn open_chapter(&self, text: &str) -> (SessionId, DialogueView) {
        let segmentation = self.classifier.segment(text);
        log::debug!("chapter segmented with {:?}", segmentation.mode);
        self.create_session(segmentation.segments)
    }

    /// The current view. Read-only: the stored session is not written back.
    pub fn get_view(&self, id: &SessionId) -> Result<DialogueView, ReaderError> {
        Ok(self.load(id)?.peek())
    }

    pub fn confirm(&self, id: &SessionId) -> Result<DialogueView, ReaderError> {
        self.with_session(id, ReadingSession::confirm)
    }

    pub fn advance(&self, id: &SessionId) -> Result<DialogueView, ReaderError> {
        self.with_session(id, ReadingSession::advance)
    }

    /// The most recent `limit` entries, oldest first; `limit <= 0` means all.
    pub fn history(&self, id: &SessionId, limit: i64) -> Result<Vec<HistoryEntry>, ReaderError> {
        let session = self.load(id)?;
        Ok(session.recent_history(limit).to_vec())
    }

    /// Vocabulary analysis over a stored session. Per-segment results are
    /// kept on the session.
    pub fn analyze_session<T: AsRef<str>>(
        &self,
        id: &SessionId,
        required_tokens: &[T],
        scope: AnalysisScope,
    ) -> Result<UsageReport, ReaderError> {
        self.with_session(id, |session| Ok(session.analyze(required_tokens, scope)))
    }

    /// Vocabulary analysis over segments the caller holds.
    pub fn analyze_segments<T: AsRef<str>>(
        &self,
        segments: &mut [Segment],
        required_tokens: &[T],
    ) -> UsageReport {
        vocabulary::analyze(segments, required_tokens)
    }

    pub fn stats(&self, id: &SessionId) -> Result<SessionStats, ReaderError> {
        Ok(self.load(id)?.stats())
    }

    pub fn delete_session(&self, id: &SessionId) -> Result<(), ReaderError> {
        if self.store.delete(id) {
            log::info!("deleted session {}", id);
            Ok(())
        } else {
            Err(ReaderError::SessionNotFound(id.clone()))
        }
    }

    fn load(&self, id: &SessionId) -> Result<ReadingSession, ReaderError> {
        self.store
            .get(id)
            .ok_or_else(|| ReaderError::SessionNotFound(id.clone()))
    }

    /// Load, apply `op`, and store the session back only if `op` succeeded.
    fn with_session<T, F>(&self, id: &SessionId, op: F) -> Result<T, ReaderError>
    where
        F: FnOnce(&mut ReadingSession) -> Result<T, TransitionError>,
    {
        let mut session = self.load(id)?;
        let result = op(&mut session)?;
        self.store.put(session);
        Ok(result)
    }
}

impl<S: SessionStore> DialogueReaderBuilder<S> {
    /// Load the classifier config from a RON file.
    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    /// Provide the classifier config directly.
    pub fn with_config(mut self, config: ClassifierConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// When false, `advance` may move past protagonist lines without a
    /// confirmation. Defaults to true.
    pub fn strict_confirmation(mut self, strict: bool) -> Self {
        self.strict_confirmation = strict;
        self
    }

    /// Use a different session store.
    pub fn with_store<T: SessionStore>(self, store: T) -> DialogueReaderBuilder<T> {
        DialogueReaderBuilder {
            config_path: self.config_path,
            config: self.config,
            store,
            strict_confirmation: self.strict_confirmation,
        }
    }

    pub fn build(self) -> Result<DialogueReader<S>, ReaderError> {
        // A config file overrides a directly provided config.
        let config = match self.config_path {
            Some(ref path) => ClassifierConfig::load_from_ron(Path::new(path))?,
            None => self.config.unwrap_or_default(),
        };

        Ok(DialogueReader {
            classifier: Classifier::new(config),
            store: self.store,
            strict_confirmation: self.strict_confirmation,
        })
    }
}
