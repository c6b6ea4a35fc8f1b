//! Dialogue Reader — interactive reading of generated narrative.
//!
//! Splits chapter text into speaker-attributed segments (explicit marker
//! grammar or lexical heuristics) and walks a reader through them with a
//! session state machine that waits for the reader to acknowledge every
//! protagonist line before moving on.

pub mod core;
pub mod schema;

pub use crate::core::classifier::{Classifier, ParseMode, Segmentation};
pub use crate::core::reader::{DialogueReader, ErrorKind, ReaderError};
pub use crate::schema::segment::{Segment, SpeakerKind};
