/// Speaker attribution rules for quoted speech in unmarked prose.
///
/// Each rule is a pure function that looks at the text around a quoted span
/// and either attributes it or passes. Rules run in `RULES` order and the
/// first hit wins, so any first-person evidence resolves toward the
/// protagonist before character names are considered.

use regex::Regex;
use std::sync::LazyLock;

use crate::core::config::ClassifierConfig;

/// Characters that mark speech after a speaker ("X说", "X道").
const SPEECH_VERBS: &[char] = &['说', '道', '曰', '言'];

static FIRST_PERSON_SPEECH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"我们?[说道曰言想]").expect("first-person speech pattern"));

static FIRST_PERSON_INNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"我们?(?:心中|内心|暗想)").expect("inner voice pattern"));

static INTROSPECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"我们?(?:想|觉得|认为|感到)").expect("introspection pattern"));

static DEDUCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"看来|原来|难道").expect("deduction pattern"));

static NAMED_SPEECH_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)[说道曰言问答回复]").expect("leading name pattern"));

static NAMED_SPEECH_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)[说道曰言]").expect("trailing name pattern"));

/// The neighbourhood of one quoted span.
#[derive(Debug, Clone, Copy)]
pub struct QuoteContext<'a> {
    /// Up to `context_window` characters immediately before the opening glyph.
    pub before: &'a str,
    /// Up to `context_window` characters immediately after the closing glyph.
    pub after: &'a str,
    /// The quoted text, without glyphs.
    pub content: &'a str,
}

impl<'a> QuoteContext<'a> {
    /// Build a context from the full paragraph text around a span.
    pub fn new(preceding: &'a str, following: &'a str, content: &'a str, window: usize) -> Self {
        Self {
            before: tail_chars(preceding, window),
            after: head_chars(following, window),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    Protagonist,
    Character(String),
}

pub type Rule = fn(&QuoteContext<'_>, &ClassifierConfig) -> Option<Attribution>;

/// Attribution rules in priority order.
pub const RULES: &[(&str, Rule)] = &[
    ("protagonist_before", protagonist_before),
    ("protagonist_after", protagonist_after),
    ("protagonist_content", protagonist_content),
    ("character_before", character_before),
    ("character_after", character_after),
];

/// Run the rule chain. Unattributable speech becomes a character with the
/// configured unknown name.
pub fn attribute(ctx: &QuoteContext<'_>, config: &ClassifierConfig) -> Attribution {
    for (name, rule) in RULES {
        if let Some(attribution) = rule(ctx, config) {
            log::debug!("rule {name} attributed {:?} to {:?}", ctx.content, attribution);
            return attribution;
        }
    }
    Attribution::Character(config.unknown_name.clone())
}

/// "我说" / "主角道" / "我暗想" shortly before the quote.
pub fn protagonist_before(ctx: &QuoteContext<'_>, config: &ClassifierConfig) -> Option<Attribution> {
    first_person_cue(ctx.before, config).then_some(Attribution::Protagonist)
}

/// "……"我说 / "……"我想 / "……"主角说 shortly after the quote.
pub fn protagonist_after(ctx: &QuoteContext<'_>, config: &ClassifierConfig) -> Option<Attribution> {
    first_person_cue(ctx.after, config).then_some(Attribution::Protagonist)
}

/// First-person opening, introspection or deduction inside the quote itself.
pub fn protagonist_content(ctx: &QuoteContext<'_>, _config: &ClassifierConfig) -> Option<Attribution> {
    let hit = ctx.content.starts_with('我')
        || INTROSPECTION.is_match(ctx.content)
        || DEDUCTION.is_match(ctx.content);
    hit.then_some(Attribution::Protagonist)
}

/// "<name>说：" shortly before the quote.
pub fn character_before(ctx: &QuoteContext<'_>, config: &ClassifierConfig) -> Option<Attribution> {
    captured_name(&NAMED_SPEECH_BEFORE, ctx.before, config)
}

/// "……"<name>说 shortly after the quote.
pub fn character_after(ctx: &QuoteContext<'_>, config: &ClassifierConfig) -> Option<Attribution> {
    captured_name(&NAMED_SPEECH_AFTER, ctx.after, config)
}

fn captured_name(pattern: &Regex, window: &str, config: &ClassifierConfig) -> Option<Attribution> {
    let name = pattern.captures(window)?.get(1)?.as_str();
    if config.is_excluded_name(name) {
        return None;
    }
    Some(Attribution::Character(name.to_string()))
}

/// First-person speech or thought, or the protagonist named as speaker.
fn first_person_cue(window: &str, config: &ClassifierConfig) -> bool {
    FIRST_PERSON_SPEECH.is_match(window)
        || FIRST_PERSON_INNER.is_match(window)
        || names_speaker(window, &config.protagonist_name)
        || config
            .protagonist_aliases
            .iter()
            .any(|alias| names_speaker(window, alias))
}

fn names_speaker(window: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    window.match_indices(name).any(|(idx, _)| {
        window[idx + name.len()..]
            .chars()
            .next()
            .is_some_and(|c| SPEECH_VERBS.contains(&c))
    })
}

/// The last `n` characters of `s`.
pub fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// The first `n` characters of `s`.
pub fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
