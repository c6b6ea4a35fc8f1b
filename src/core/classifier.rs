/// Segment classifier — turns chapter text into speaker-attributed segments.
///
/// Three strategies, tried in order:
/// - marker grammar (`正文：` / `主角：` / `名字：` line prefixes), used for the
///   whole text as soon as any narration or protagonist marker appears;
/// - heuristics over quoted spans, paragraph by paragraph, for unmarked prose;
/// - a line-by-line fallback when neither produced anything.
///
/// Classification never fails. Ambiguous speech resolves to a documented
/// default instead of an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::core::config::ClassifierConfig;
use crate::core::rules::{self, Attribution, QuoteContext};
use crate::schema::segment::{Segment, SpeakerKind};

static CHAPTER_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#*\s*第\w+[章节][：:]").expect("chapter title pattern"));

/// Which strategy produced a segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    Marked,
    Heuristic,
    Fallback,
    /// Blank input; no strategy ran.
    Empty,
}

/// Segments plus the strategy that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub mode: ParseMode,
    pub segments: Vec<Segment>,
}

/// A quoted span inside a paragraph, as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QuoteSpan {
    /// Offset of the opening glyph.
    start: usize,
    /// Offset just past the closing glyph.
    end: usize,
    content_start: usize,
    content_end: usize,
}

/// Collects segments, numbering them and dropping blank content.
struct SegmentSink {
    segments: Vec<Segment>,
}

impl SegmentSink {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push(&mut self, kind: SpeakerKind, name: &str, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        let sequence = self.segments.len();
        self.segments
            .push(Segment::new(kind, name, content, sequence));
    }

    fn finish(self) -> Vec<Segment> {
        self.segments
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Split `text` into an ordered sequence of segments.
    pub fn classify(&self, text: &str) -> Vec<Segment> {
        self.segment(text).segments
    }

    /// Like [`Classifier::classify`], but also reports which strategy was used.
    pub fn segment(&self, text: &str) -> Segmentation {
        if text.trim().is_empty() {
            return Segmentation {
                mode: ParseMode::Empty,
                segments: Vec::new(),
            };
        }

        let (mode, segments) = if self.has_markers(text) {
            (ParseMode::Marked, self.parse_marked(text))
        } else {
            (ParseMode::Heuristic, self.parse_heuristic(text))
        };

        if !segments.is_empty() {
            log::debug!("{:?} segmentation produced {} segments", mode, segments.len());
            return Segmentation { mode, segments };
        }

        log::warn!("{:?} segmentation produced nothing, using line fallback", mode);
        Segmentation {
            mode: ParseMode::Fallback,
            segments: self.parse_fallback(text),
        }
    }

    /// True if any narration or protagonist marker occurs anywhere in `text`.
    pub fn has_markers(&self, text: &str) -> bool {
        self.config
            .markers()
            .iter()
            .any(|m| text.contains(m.as_str()))
    }

    fn parse_marked(&self, text: &str) -> Vec<Segment> {
        let config = &self.config;
        let mut sink = SegmentSink::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = self.strip_label(line, &config.narration_label) {
                sink.push(SpeakerKind::Narrator, &config.narrator_name, rest);
            } else if let Some(rest) = self.strip_label(line, &config.protagonist_label) {
                sink.push(SpeakerKind::Protagonist, &config.protagonist_name, rest);
            } else if let Some((name, rest)) = self.split_speaker(line) {
                sink.push(SpeakerKind::Character, name, rest);
            } else {
                self.parse_paragraph(line, &mut sink);
            }
        }

        sink.finish()
    }

    /// `label` followed by one of the separators.
    fn strip_label<'a>(&self, line: &'a str, label: &str) -> Option<&'a str> {
        let rest = line.strip_prefix(label)?;
        let mut chars = rest.chars();
        let sep = chars.next()?;
        self.config
            .separators
            .contains(&sep)
            .then(|| chars.as_str())
    }

    /// `name：text` with a plausible speaker name and non-empty text.
    fn split_speaker<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let config = &self.config;
        let (idx, sep) = line
            .char_indices()
            .find(|(_, c)| config.separators.contains(c))?;
        let name = line[..idx].trim();
        let rest = line[idx + sep.len_utf8()..].trim();

        let plausible = !name.is_empty()
            && name.chars().count() <= config.max_speaker_name_len
            && !name.starts_with('第')
            && name != config.narration_label
            && name != config.protagonist_label;

        (plausible && !rest.is_empty()).then_some((name, rest))
    }

    fn parse_heuristic(&self, text: &str) -> Vec<Segment> {
        let mut sink = SegmentSink::new();
        for paragraph in split_paragraphs(text) {
            self.parse_paragraph(&paragraph, &mut sink);
        }
        sink.finish()
    }

    fn parse_paragraph(&self, paragraph: &str, sink: &mut SegmentSink) {
        let config = &self.config;

        if is_chapter_title(paragraph) {
            sink.push(SpeakerKind::Narrator, &config.narrator_name, paragraph);
            return;
        }

        let spans = self.quoted_spans(paragraph);
        if spans.is_empty() {
            sink.push(SpeakerKind::Narrator, &config.narrator_name, paragraph);
            return;
        }

        let mut last_end = 0;
        for span in spans {
            sink.push(
                SpeakerKind::Narrator,
                &config.narrator_name,
                &paragraph[last_end..span.start],
            );

            let content = &paragraph[span.content_start..span.content_end];
            let ctx = QuoteContext::new(
                &paragraph[..span.start],
                &paragraph[span.end..],
                content,
                config.context_window,
            );
            match rules::attribute(&ctx, config) {
                Attribution::Protagonist => {
                    sink.push(SpeakerKind::Protagonist, &config.protagonist_name, content)
                }
                Attribution::Character(name) => {
                    sink.push(SpeakerKind::Character, &name, content)
                }
            }
            last_end = span.end;
        }

        sink.push(
            SpeakerKind::Narrator,
            &config.narrator_name,
            &paragraph[last_end..],
        );
    }

    /// Quoted spans, left to right. An opening glyph without a matching
    /// closing glyph is treated as plain text.
    fn quoted_spans(&self, paragraph: &str) -> Vec<QuoteSpan> {
        let mut spans = Vec::new();
        let mut cursor = 0;

        while cursor < paragraph.len() {
            let Some((offset, pair)) = paragraph[cursor..].char_indices().find_map(|(i, c)| {
                self.config
                    .quote_pairs
                    .iter()
                    .find(|pair| pair.open == c)
                    .map(|pair| (cursor + i, *pair))
            }) else {
                break;
            };

            let content_start = offset + pair.open.len_utf8();
            match paragraph[content_start..].find(pair.close) {
                Some(rel) => {
                    let content_end = content_start + rel;
                    let end = content_end + pair.close.len_utf8();
                    spans.push(QuoteSpan {
                        start: offset,
                        end,
                        content_start,
                        content_end,
                    });
                    cursor = end;
                }
                None => cursor = content_start,
            }
        }

        spans
    }

    fn parse_fallback(&self, text: &str) -> Vec<Segment> {
        let config = &self.config;
        let mut sink = SegmentSink::new();
        for line in text.lines() {
            if config.has_quote_glyph(line) {
                sink.push(SpeakerKind::Character, &config.fallback_unknown_name, line);
            } else {
                sink.push(SpeakerKind::Narrator, &config.narrator_name, line);
            }
        }
        sink.finish()
    }
}

/// True for "第一章：…" style headings, optionally behind Markdown `#`s.
pub fn is_chapter_title(line: &str) -> bool {
    CHAPTER_TITLE.is_match(line)
}

/// Blank-line delimited paragraphs with inner line breaks joined by a
/// space. Chapter titles always stand alone.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }

        if is_chapter_title(line) {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            paragraphs.push(line.to_string());
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::QuotePair;

    fn kinds(segments: &[Segment]) -> Vec<(SpeakerKind, &str, &str)> {
        segments
            .iter()
            .map(|s| (s.speaker_kind, s.speaker_name.as_str(), s.content.as_str()))
            .collect()
    }

    #[test]
    fn marked_grammar_scenario() {
        let classifier = Classifier::default();
        let seg = classifier.segment("正文：天黑了。\n主角：我们走吧。\n小李：等等我。");
        assert_eq!(seg.mode, ParseMode::Marked);
        assert_eq!(
            kinds(&seg.segments),
            vec![
                (SpeakerKind::Narrator, "旁白", "天黑了。"),
                (SpeakerKind::Protagonist, "主角", "我们走吧。"),
                (SpeakerKind::Character, "小李", "等等我。"),
            ]
        );
        let sequences: Vec<usize> = seg.segments.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn default_classifier_matches_default_config() {
        let text = "正文：天黑了。\n主角：我们走吧。\n小李：等等我。";
        let by_default = Classifier::default().segment(text);
        let by_config = Classifier::new(ClassifierConfig::default()).segment(text);
        assert_eq!(by_default, by_config);
        assert_eq!(by_default.mode, ParseMode::Marked);
        assert_eq!(by_default.segments.len(), 3);
    }

    #[test]
    fn marked_sequence_skips_blank_lines() {
        let classifier = Classifier::default();
        let segments = classifier.classify("\n正文：一。\n\n\n主角：二。\n   \n正文：\n");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].sequence, 1);
        assert_eq!(segments[1].content, "二。");
    }

    #[test]
    fn marked_ascii_colon_and_whitespace() {
        let classifier = Classifier::default();
        let segments = classifier.classify("  主角:  出发！  \n老王 : 好。");
        assert_eq!(
            kinds(&segments),
            vec![
                (SpeakerKind::Protagonist, "主角", "出发！"),
                (SpeakerKind::Character, "老王", "好。"),
            ]
        );
    }

    #[test]
    fn marked_rejects_implausible_speakers() {
        let classifier = Classifier::default();
        let long_name = "很".repeat(21);
        let text = format!(
            "正文：开场。\n第一章：风起\n{long_name}：不是名字。\n没有冒号的一行。\n小李："
        );
        let segments = classifier.classify(&text);
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[1].speaker_kind, SpeakerKind::Narrator);
        assert_eq!(segments[1].content, "第一章：风起");
        assert_eq!(segments[2].speaker_kind, SpeakerKind::Narrator);
        assert_eq!(segments[2].content, format!("{long_name}：不是名字。"));
        assert_eq!(segments[3].content, "没有冒号的一行。");
        assert_eq!(segments[4].content, "小李：");
    }

    #[test]
    fn marked_name_at_length_limit_is_accepted() {
        let classifier = Classifier::default();
        let name = "长".repeat(20);
        let segments = classifier.classify(&format!("主角：嗯。\n{name}：对。"));
        assert_eq!(segments[1].speaker_kind, SpeakerKind::Character);
        assert_eq!(segments[1].speaker_name, name);
    }

    #[test]
    fn marked_unattributed_line_uses_quote_heuristics() {
        let classifier = Classifier::default();
        let segments = classifier.classify("正文：夜深了。\n他推开门，“有人吗？”");
        assert_eq!(
            kinds(&segments),
            vec![
                (SpeakerKind::Narrator, "旁白", "夜深了。"),
                (SpeakerKind::Narrator, "旁白", "他推开门，"),
                (SpeakerKind::Character, "未知角色", "有人吗？"),
            ]
        );
    }

    #[test]
    fn marker_label_without_separator_is_not_a_marker() {
        let classifier = Classifier::default();
        assert!(!classifier.has_markers("主角走进了房间。"));
        assert!(classifier.has_markers("开头\n主角：嗯"));
    }

    #[test]
    fn heuristic_paragraph_with_speech() {
        let classifier = Classifier::default();
        let text = "维克多的投影闪烁着。“你迟到了，凯。”维克多说。";
        let seg = classifier.segment(text);
        assert_eq!(seg.mode, ParseMode::Heuristic);
        assert_eq!(
            kinds(&seg.segments),
            vec![
                (SpeakerKind::Narrator, "旁白", "维克多的投影闪烁着。"),
                (SpeakerKind::Character, "维克多", "你迟到了，凯。"),
                (SpeakerKind::Narrator, "旁白", "维克多说。"),
            ]
        );
    }

    #[test]
    fn heuristic_protagonist_speech() {
        let classifier = Classifier::default();
        let segments = classifier.classify("我说：“走吧。”\n\n“看来他早就知道了。”");
        assert_eq!(
            kinds(&segments),
            vec![
                (SpeakerKind::Narrator, "旁白", "我说："),
                (SpeakerKind::Protagonist, "主角", "走吧。"),
                (SpeakerKind::Protagonist, "主角", "看来他早就知道了。"),
            ]
        );
    }

    #[test]
    fn heuristic_trailing_thought_or_label_is_protagonist() {
        let classifier = Classifier::default();
        for text in ["“走吧。”主角说。", "“走吧。”我想。"] {
            let segments = classifier.classify(text);
            assert_eq!(segments[0].speaker_kind, SpeakerKind::Protagonist, "{text}");
            assert_eq!(segments[0].speaker_name, "主角", "{text}");
            assert_eq!(segments[0].content, "走吧。");
            assert_eq!(segments[1].speaker_kind, SpeakerKind::Narrator);
        }
    }

    #[test]
    fn heuristic_paragraph_without_quotes_is_one_narration() {
        let classifier = Classifier::default();
        let segments = classifier.classify("雨一直下。\n街上没有人。\n\n天亮了。");
        assert_eq!(
            kinds(&segments),
            vec![
                (SpeakerKind::Narrator, "旁白", "雨一直下。 街上没有人。"),
                (SpeakerKind::Narrator, "旁白", "天亮了。"),
            ]
        );
    }

    #[test]
    fn heuristic_chapter_title_stands_alone() {
        let classifier = Classifier::default();
        let segments = classifier.classify("# 第一章：霓虹深渊\n雨水混杂着霓虹灯光。");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].content, "# 第一章：霓虹深渊");
        assert_eq!(segments[1].content, "雨水混杂着霓虹灯光。");
    }

    #[test]
    fn heuristic_unclosed_quote_is_plain_text() {
        let classifier = Classifier::default();
        let segments = classifier.classify("他喊道：“等一下");
        assert_eq!(
            kinds(&segments),
            vec![(SpeakerKind::Narrator, "旁白", "他喊道：“等一下")]
        );
    }

    #[test]
    fn heuristic_multiple_quotes_in_one_paragraph() {
        let classifier = Classifier::default();
        let text = "“暴雨导致线路瘫痪，”凯低声回应，“你知道的。”";
        let segments = classifier.classify(text);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].content, "暴雨导致线路瘫痪，");
        assert_eq!(segments[1].content, "凯低声回应，");
        assert_eq!(segments[1].speaker_kind, SpeakerKind::Narrator);
        assert_eq!(segments[2].content, "你知道的。");
        assert_eq!(segments[2].sequence, 2);
    }

    #[test]
    fn custom_quote_pairs() {
        let config = ClassifierConfig {
            quote_pairs: vec![QuotePair::new('『', '』')],
            ..ClassifierConfig::default()
        };
        let classifier = Classifier::new(config);
        let segments = classifier.classify("她笑道『好啊』");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].content, "好啊");
        assert_eq!(segments[1].speaker_name, "她笑");
    }

    #[test]
    fn empty_quotes_fall_back_to_lines() {
        let classifier = Classifier::default();
        let seg = classifier.segment("“”");
        assert_eq!(seg.mode, ParseMode::Fallback);
        assert_eq!(
            kinds(&seg.segments),
            vec![(SpeakerKind::Character, "未知", "“”")]
        );
    }

    #[test]
    fn marked_text_with_only_empty_markers_falls_back() {
        let classifier = Classifier::default();
        let seg = classifier.segment("正文：\n主角：");
        assert_eq!(seg.mode, ParseMode::Fallback);
        assert_eq!(seg.segments.len(), 2);
        assert!(seg.segments.iter().all(|s| s.speaker_kind == SpeakerKind::Narrator));
    }

    #[test]
    fn blank_input_is_empty() {
        let classifier = Classifier::default();
        assert_eq!(classifier.segment("").mode, ParseMode::Empty);
        assert!(classifier.classify(" \n\t\n").is_empty());
    }

    #[test]
    fn paragraphs_join_lines_and_isolate_titles() {
        let paragraphs = split_paragraphs("甲\n乙\n第二章：雨\n丙\n\n丁");
        assert_eq!(paragraphs, vec!["甲 乙", "第二章：雨", "丙", "丁"]);
    }

    #[test]
    fn chapter_title_detection() {
        assert!(is_chapter_title("第十二章：归来"));
        assert!(is_chapter_title("第三节:序"));
        assert!(is_chapter_title("## 第一章：霓虹深渊"));
        assert!(!is_chapter_title("第一次见面"));
        assert!(!is_chapter_title("他说第一章：不对"));
    }
}
