use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::segment::Segment;

/// A record of one segment the reader has passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sequence: usize,
    pub speaker: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub was_protagonist: bool,
}

impl HistoryEntry {
    pub fn record(segment: &Segment, timestamp: DateTime<Utc>) -> Self {
        Self {
            sequence: segment.sequence,
            speaker: segment.speaker_name.clone(),
            content: segment.content.clone(),
            timestamp,
            was_protagonist: segment.is_protagonist(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::segment::SpeakerKind;

    #[test]
    fn record_copies_segment_fields() {
        let seg = Segment::new(SpeakerKind::Character, "小李", "等等我。", 2);
        let now = Utc::now();
        let entry = HistoryEntry::record(&seg, now);
        assert_eq!(entry.sequence, 2);
        assert_eq!(entry.speaker, "小李");
        assert_eq!(entry.content, "等等我。");
        assert_eq!(entry.timestamp, now);
        assert!(!entry.was_protagonist);
    }
}
