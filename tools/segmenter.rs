/// Segmenter — classifies a chapter file and prints its segments.
///
/// Usage: segmenter --input <chapter.txt> [--config <classifier.ron>]
///                  [--required <tok1,tok2,...>] [--json]
use dialogue_reader::core::classifier::Classifier;
use dialogue_reader::core::config::ClassifierConfig;
use dialogue_reader::core::vocabulary;
use dialogue_reader::schema::segment::SpeakerKind;
use std::env;
use std::path::Path;
use std::process;

const USAGE: &str =
    "Usage: segmenter --input <chapter.txt> [--config <classifier.ron>] [--required <tok1,tok2,...>] [--json]";

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut config_path = None;
    let mut required: Vec<String> = Vec::new();
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--required" if i + 1 < args.len() => {
                i += 1;
                required = args[i]
                    .split([',', '，'])
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
            }
            "--json" => json = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{USAGE}");
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{USAGE}");
        process::exit(1);
    });

    let config = match config_path {
        Some(ref path) => ClassifierConfig::load_from_ron(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error loading config '{}': {}", path, e);
            process::exit(1);
        }),
        None => ClassifierConfig::default(),
    };

    let text = std::fs::read_to_string(&input_path).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input_path, e);
        process::exit(1);
    });

    let classifier = Classifier::new(config);
    let mut segmentation = classifier.segment(&text);
    let report = (!required.is_empty())
        .then(|| vocabulary::analyze(&mut segmentation.segments, &required));

    if json {
        let output = serde_json::json!({
            "mode": segmentation.mode,
            "segments": segmentation.segments,
            "usage": report,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!(
        "{} segments from '{}' ({:?})",
        segmentation.segments.len(),
        input_path,
        segmentation.mode
    );
    for segment in &segmentation.segments {
        let marker = match segment.speaker_kind {
            SpeakerKind::Protagonist => '*',
            SpeakerKind::Character => '>',
            SpeakerKind::Narrator => ' ',
        };
        println!(
            "{:>4} {} [{}] {}",
            segment.sequence, marker, segment.speaker_name, segment.content
        );
    }

    if let Some(report) = report {
        println!();
        println!(
            "Required vocabulary: {}/{} used ({:.1}%)",
            report.used_tokens.len(),
            report.total_required,
            report.usage_rate * 100.0
        );
        if !report.unused_tokens.is_empty() {
            println!("Unused: {}", report.unused_tokens.join(" "));
        }
        for usage in report.per_segment_usage.iter().filter(|u| !u.tokens_used.is_empty()) {
            println!(
                "{:>4} {} <- {}",
                usage.sequence,
                usage.content,
                usage.tokens_used.join(" ")
            );
        }
    }
}
