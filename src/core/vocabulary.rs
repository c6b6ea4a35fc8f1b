/// Required-vocabulary analysis over protagonist speech.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::schema::segment::Segment;

/// Tokens found in one protagonist segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentUsage {
    pub sequence: usize,
    pub content: String,
    pub tokens_used: Vec<String>,
}

/// How much of the required vocabulary the protagonist actually says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub total_required: usize,
    /// Used tokens, in the order they were required.
    pub used_tokens: Vec<String>,
    /// Unused tokens, in the order they were required.
    pub unused_tokens: Vec<String>,
    /// `used / required`; 1.0 when nothing is required.
    pub usage_rate: f64,
    pub per_segment_usage: Vec<SegmentUsage>,
}

/// Analyze protagonist segments against a list of required tokens.
///
/// Membership is plain substring containment. Duplicate tokens count once.
/// Writes each protagonist segment's `required_chars_used`; other segments
/// are left untouched.
pub fn analyze<S: AsRef<str>>(segments: &mut [Segment], required_tokens: &[S]) -> UsageReport {
    let mut seen = FxHashSet::default();
    let required: Vec<&str> = required_tokens
        .iter()
        .map(AsRef::as_ref)
        .filter(|token| !token.is_empty() && seen.insert(*token))
        .collect();

    let mut used: FxHashSet<&str> = FxHashSet::default();
    let mut per_segment_usage = Vec::new();

    for segment in segments.iter_mut().filter(|s| s.is_protagonist()) {
        let tokens_used: Vec<String> = required
            .iter()
            .filter(|token| segment.content.contains(**token))
            .map(|token| token.to_string())
            .collect();
        used.extend(
            required
                .iter()
                .copied()
                .filter(|token| segment.content.contains(*token)),
        );

        segment.required_chars_used = tokens_used.clone();
        per_segment_usage.push(SegmentUsage {
            sequence: segment.sequence,
            content: segment.content.clone(),
            tokens_used,
        });
    }

    let (used_tokens, unused_tokens): (Vec<&str>, Vec<&str>) =
        required.iter().copied().partition(|token| used.contains(*token));

    let usage_rate = if required.is_empty() {
        1.0
    } else {
        used_tokens.len() as f64 / required.len() as f64
    };

    UsageReport {
        total_required: required.len(),
        used_tokens: used_tokens.into_iter().map(str::to_string).collect(),
        unused_tokens: unused_tokens.into_iter().map(str::to_string).collect(),
        usage_rate,
        per_segment_usage,
    }
}
