//! WASM bindings for dialogue-reader — powers the browser reading view.

use wasm_bindgen::prelude::*;

use dialogue_reader::core::config::ClassifierConfig;
use dialogue_reader::core::reader::{DialogueReader, ReaderError};
use dialogue_reader::core::session::AnalysisScope;
use dialogue_reader::core::vocabulary::UsageReport;
use dialogue_reader::schema::segment::Segment;
use dialogue_reader::schema::session_id::SessionId;
use dialogue_reader::schema::view::DialogueView;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct OpenedSession {
    session_id: String,
    view: DialogueView,
}

#[derive(serde::Serialize)]
struct AnalyzedSegments {
    report: UsageReport,
    segments: Vec<Segment>,
}

#[derive(serde::Serialize)]
struct ErrorInfo<'a> {
    code: &'a str,
    message: String,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn parse_scope(s: &str) -> Option<AnalysisScope> {
    match s.to_lowercase().as_str() {
        "all" => Some(AnalysisScope::All),
        "read" => Some(AnalysisScope::Read),
        _ => None,
    }
}

fn parse_tokens(tokens_json: &str) -> Result<Vec<String>, JsError> {
    serde_json::from_str(tokens_json)
        .map_err(|e| JsError::new(&format!("Invalid tokens JSON: {e}")))
}

fn parse_segments(segments_json: &str) -> Result<Vec<Segment>, JsError> {
    serde_json::from_str(segments_json)
        .map_err(|e| JsError::new(&format!("Invalid segments JSON: {e}")))
}

/// Errors cross the boundary as a JSON object so callers can branch on `code`.
fn reader_error(e: ReaderError) -> JsError {
    let info = ErrorInfo {
        code: e.code(),
        message: e.to_string(),
    };
    let json = serde_json::to_string(&info).unwrap_or_else(|_| e.code().to_string());
    JsError::new(&json)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// WasmReader — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct WasmReader {
    reader: DialogueReader,
}

#[wasm_bindgen]
impl WasmReader {
    /// Create a reader. `config_ron` is an optional classifier config in RON;
    /// `strict` forbids advancing past protagonist lines.
    #[wasm_bindgen(constructor)]
    pub fn new(config_ron: Option<String>, strict: bool) -> Result<WasmReader, JsError> {
        let config = match config_ron {
            Some(src) => ClassifierConfig::parse_ron(&src)
                .map_err(|e| JsError::new(&format!("Config parse error: {e}")))?,
            None => ClassifierConfig::default(),
        };
        let reader = DialogueReader::builder()
            .with_config(config)
            .strict_confirmation(strict)
            .build()
            .map_err(reader_error)?;
        Ok(WasmReader { reader })
    }

    /// Classify chapter text. Returns a JSON array of segments.
    pub fn classify(&self, text: &str) -> Result<String, JsError> {
        to_json(&self.reader.classify(text))
    }

    /// Classify a chapter and open a session over it.
    ///
    /// Returns `{ "session_id": "...", "view": { ... } }`.
    pub fn open_chapter(&self, text: &str) -> Result<String, JsError> {
        let (id, view) = self.reader.open_chapter(text);
        to_json(&OpenedSession {
            session_id: id.0,
            view,
        })
    }

    /// Open a session over a JSON array of segments.
    pub fn create_session(&self, segments_json: &str) -> Result<String, JsError> {
        let segments = parse_segments(segments_json)?;
        let (id, view) = self.reader.create_session(segments);
        to_json(&OpenedSession {
            session_id: id.0,
            view,
        })
    }

    pub fn get_view(&self, session_id: &str) -> Result<String, JsError> {
        let view = self
            .reader
            .get_view(&SessionId::from(session_id))
            .map_err(reader_error)?;
        to_json(&view)
    }

    pub fn confirm(&self, session_id: &str) -> Result<String, JsError> {
        let view = self
            .reader
            .confirm(&SessionId::from(session_id))
            .map_err(reader_error)?;
        to_json(&view)
    }

    pub fn advance(&self, session_id: &str) -> Result<String, JsError> {
        let view = self
            .reader
            .advance(&SessionId::from(session_id))
            .map_err(reader_error)?;
        to_json(&view)
    }

    /// JSON array of the last `limit` history entries; `limit <= 0` returns all.
    pub fn history(&self, session_id: &str, limit: i32) -> Result<String, JsError> {
        let entries = self
            .reader
            .history(&SessionId::from(session_id), i64::from(limit))
            .map_err(reader_error)?;
        to_json(&entries)
    }

    /// Vocabulary report. `tokens_json` is a JSON array of strings; `scope`
    /// is `"all"` or `"read"`.
    pub fn analyze(&self, session_id: &str, tokens_json: &str, scope: &str) -> Result<String, JsError> {
        let scope = parse_scope(scope)
            .ok_or_else(|| JsError::new(&format!("Unknown analysis scope: {scope}")))?;
        let tokens = parse_tokens(tokens_json)?;
        let report = self
            .reader
            .analyze_session(&SessionId::from(session_id), &tokens, scope)
            .map_err(reader_error)?;
        to_json(&report)
    }

    /// Vocabulary report over a JSON array of segments, without a session.
    ///
    /// Returns `{ "report": { ... }, "segments": [ ... ] }` with each
    /// protagonist segment's `required_chars_used` filled in.
    pub fn analyze_segments(&self, segments_json: &str, tokens_json: &str) -> Result<String, JsError> {
        let mut segments = parse_segments(segments_json)?;
        let tokens = parse_tokens(tokens_json)?;
        let report = self.reader.analyze_segments(&mut segments, &tokens);
        to_json(&AnalyzedSegments { report, segments })
    }

    pub fn stats(&self, session_id: &str) -> Result<String, JsError> {
        let stats = self
            .reader
            .stats(&SessionId::from(session_id))
            .map_err(reader_error)?;
        to_json(&stats)
    }

    pub fn delete_session(&self, session_id: &str) -> Result<(), JsError> {
        self.reader
            .delete_session(&SessionId::from(session_id))
            .map_err(reader_error)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.reader.store().len()
    }
}
