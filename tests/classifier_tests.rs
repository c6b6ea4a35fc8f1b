/// Classifier integration tests — fixture chapters and generated marked text.

use dialogue_reader::core::classifier::{Classifier, ParseMode};
use dialogue_reader::core::config::ClassifierConfig;
use dialogue_reader::core::vocabulary;
use dialogue_reader::schema::segment::{Segment, SpeakerKind};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn summary(segments: &[Segment]) -> Vec<(usize, SpeakerKind, String, String)> {
    segments
        .iter()
        .map(|s| {
            (
                s.sequence,
                s.speaker_kind,
                s.speaker_name.clone(),
                s.content.clone(),
            )
        })
        .collect()
}

fn row(seq: usize, kind: SpeakerKind, name: &str, content: &str) -> (usize, SpeakerKind, String, String) {
    (seq, kind, name.to_string(), content.to_string())
}

#[test]
fn marked_fixture_chapter() {
    let text = std::fs::read_to_string("tests/fixtures/marked_chapter.txt").unwrap();
    let seg = Classifier::default().segment(&text);
    assert_eq!(seg.mode, ParseMode::Marked);

    use SpeakerKind::*;
    assert_eq!(
        summary(&seg.segments),
        vec![
            row(0, Narrator, "旁白", "第一章：归乡"),
            row(1, Narrator, "旁白", "火车在傍晚驶进省城。"),
            row(2, Protagonist, "主角", "终于到家了。"),
            row(3, Narrator, "旁白", "站台上人来人往。"),
            row(4, Character, "阿婆", "囡囡，这边！"),
            row(5, Protagonist, "主角", "阿婆，我在这儿。"),
            row(6, Character, "老王", "车子停在外面。"),
            row(7, Narrator, "旁白", "他们一起走出了车站。"),
            row(8, Protagonist, "主角", "走吧，回家。"),
        ]
    );
}

#[test]
fn unmarked_fixture_chapter() {
    let text = std::fs::read_to_string("tests/fixtures/unmarked_chapter.txt").unwrap();
    let seg = Classifier::default().segment(&text);
    assert_eq!(seg.mode, ParseMode::Heuristic);

    use SpeakerKind::*;
    assert_eq!(
        summary(&seg.segments),
        vec![
            row(0, Narrator, "旁白", "# 第一章：霓虹深渊"),
            row(
                1,
                Narrator,
                "旁白",
                "雨水混杂着霓虹灯光，在潮湿的巷道上折射出迷离的光晕。 凯拉高外套领口，快步穿过小巷。"
            ),
            row(2, Character, "未知角色", "你迟到了，凯。"),
            row(3, Narrator, "旁白", "维克多的全息投影在凯的视网膜上闪烁。"),
            row(4, Protagonist, "主角", "暴雨导致磁悬浮线路瘫痪。"),
            row(5, Narrator, "旁白", "我说。"),
            row(6, Narrator, "旁白", "维克多说："),
            row(7, Character, "维克多", "借口不会让委托人开心。"),
            row(8, Protagonist, "主角", "看来今晚不会太平。"),
        ]
    );
}

#[test]
fn fixture_config_aliases_the_protagonist() {
    let config =
        ClassifierConfig::load_from_ron(std::path::Path::new("tests/fixtures/classifier.ron"))
            .unwrap();
    let text = "亚瑟说：“出发。”";

    let plain = Classifier::default().classify(text);
    assert_eq!(plain[1].speaker_kind, SpeakerKind::Character);
    assert_eq!(plain[1].speaker_name, "亚瑟");

    let aliased = Classifier::new(config).classify(text);
    assert_eq!(aliased[1].speaker_kind, SpeakerKind::Protagonist);
    assert_eq!(aliased[1].speaker_name, "主角");
}

#[test]
fn marked_fixture_vocabulary_report() {
    let text = std::fs::read_to_string("tests/fixtures/marked_chapter.txt").unwrap();
    let mut segments = Classifier::default().classify(&text);
    let report = vocabulary::analyze(&mut segments, &["省", "囡", "家", "车"]);

    assert_eq!(report.total_required, 4);
    assert_eq!(report.used_tokens, vec!["家".to_string()]);
    assert_eq!(
        report.unused_tokens,
        vec!["省".to_string(), "囡".to_string(), "车".to_string()]
    );
    assert_eq!(report.usage_rate, 0.25);
    assert_eq!(report.per_segment_usage.len(), 3);
    // Narration and other characters never record usage.
    assert!(segments[1].required_chars_used.is_empty());
    assert!(segments[4].required_chars_used.is_empty());
}

const NAMES: &[&str] = &["小李", "老王", "阿婆", "维克多", "Mia"];
const ALPHABET: &[char] = &[
    '天', '地', '人', '你', '他', '她', '们', '走', '来', '去', '好', '吗', '了', '。', '，', '！',
    '？', '省', '囡',
];

fn random_content(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..12);
    (0..len)
        .map(|_| *ALPHABET.choose(&mut *rng).unwrap())
        .collect()
}

#[test]
fn marked_text_reconstructs_its_lines() {
    let config = ClassifierConfig::default();
    let classifier = Classifier::new(config.clone());

    for seed in 0..200u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut lines = vec![format!("正文：{}", random_content(&mut rng))];
        for _ in 0..rng.gen_range(0..15) {
            let line = match rng.gen_range(0..3) {
                0 => format!("正文：{}", random_content(&mut rng)),
                1 => format!("主角：{}", random_content(&mut rng)),
                _ => format!("{}：{}", NAMES.choose(&mut rng).unwrap(), random_content(&mut rng)),
            };
            lines.push(line);
        }

        let mut text = String::new();
        for line in &lines {
            text.push_str(line);
            text.push('\n');
            if rng.gen_bool(0.2) {
                text.push_str("   \n");
            }
        }

        let segments = classifier.classify(&text);
        assert_eq!(segments.len(), lines.len(), "seed {seed}");

        for (i, (segment, line)) in segments.iter().zip(&lines).enumerate() {
            assert_eq!(segment.sequence, i, "seed {seed}");
            let label = match segment.speaker_kind {
                SpeakerKind::Narrator => config.narration_label.as_str(),
                SpeakerKind::Protagonist => config.protagonist_label.as_str(),
                SpeakerKind::Character => segment.speaker_name.as_str(),
            };
            assert_eq!(&format!("{label}：{}", segment.content), line, "seed {seed}");
        }
    }
}

#[test]
fn classification_never_panics_on_odd_input() {
    let classifier = Classifier::default();
    let inputs = [
        "“",
        "”“",
        "\"\"\"",
        "：",
        "主角：“”",
        "第：",
        "「未闭合",
        "我说“",
        "\n\n\n",
        "a\r\nb\r\n",
    ];
    for input in inputs {
        let segments = classifier.classify(input);
        for (i, s) in segments.iter().enumerate() {
            assert_eq!(s.sequence, i);
            assert!(!s.content.trim().is_empty());
        }
    }
}
