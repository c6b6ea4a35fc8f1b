/// Reader shell — read a chapter interactively, one segment at a time.
///
/// Usage: reader_shell --input <chapter.txt> [--config <classifier.ron>] [--loose]
///
/// Commands:
///   view              — show the current segment
///   next | n          — advance, or confirm when a protagonist line is waiting
///   confirm | c       — confirm the waiting protagonist line
///   advance | a       — advance past a narration/character line
///   history [n]       — show the last n lines read (all when omitted)
///   stats             — session statistics
///   analyze <t1,t2>   — required-vocabulary report over the whole chapter
///   reload            — start the chapter over in a new session
///   help              — list commands
///   quit              — exit
use dialogue_reader::core::reader::DialogueReader;
use dialogue_reader::core::session::AnalysisScope;
use dialogue_reader::schema::session_id::SessionId;
use dialogue_reader::schema::view::{Cue, DialogueView};
use std::io::{self, BufRead, Write};
use std::process;

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut input = None;
    let mut config_path = None;
    let mut strict = true;

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
            "--loose" => strict = false,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        print_usage();
        process::exit(1);
    });

    let text = std::fs::read_to_string(&input_path).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input_path, e);
        process::exit(1);
    });

    let mut builder = DialogueReader::builder().strict_confirmation(strict);
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    let reader = builder.build().unwrap_or_else(|e| {
        eprintln!("Error building reader: {}", e);
        process::exit(1);
    });

    let (mut id, view) = reader.open_chapter(&text);
    println!("Opened '{}' as session {}", input_path, id);
    println!("Type 'help' for commands.\n");
    print_view(&view);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("reader> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "view" | "v" => report(reader.get_view(&id)),
            "confirm" | "c" => report(reader.confirm(&id)),
            "advance" | "a" => report(reader.advance(&id)),
            "next" | "n" => {
                let waiting = reader
                    .get_view(&id)
                    .map(|v| v.waiting_for_confirmation)
                    .unwrap_or(false);
                if waiting {
                    report(reader.confirm(&id));
                } else {
                    report(reader.advance(&id));
                }
            }
            "history" => {
                let limit = match parts.get(1).map(|s| s.parse::<i64>()) {
                    None => 0,
                    Some(Ok(n)) => n,
                    Some(Err(_)) => {
                        println!("Invalid count: {}", parts[1]);
                        continue;
                    }
                };
                match reader.history(&id, limit) {
                    Ok(entries) if entries.is_empty() => println!("Nothing read yet."),
                    Ok(entries) => {
                        for entry in entries {
                            let mark = if entry.was_protagonist { '*' } else { ' ' };
                            println!(
                                "{:>4} {} [{}] {}",
                                entry.sequence, mark, entry.speaker, entry.content
                            );
                        }
                    }
                    Err(e) => println!("ERROR [{}]: {}", e.code(), e),
                }
            }
            "stats" => match reader.stats(&id) {
                Ok(stats) => {
                    println!(
                        "Progress: {}/{} ({:.1}%)",
                        stats.completed, stats.total, stats.progress_percentage
                    );
                    println!(
                        "Segments: {} protagonist ({} confirmed), {} character, {} narration",
                        stats.protagonist_segments,
                        stats.confirmed_protagonist_segments,
                        stats.character_segments,
                        stats.narrator_segments
                    );
                    println!("Started: {}", stats.created_at.format("%Y-%m-%d %H:%M:%S"));
                }
                Err(e) => println!("ERROR [{}]: {}", e.code(), e),
            },
            "analyze" => {
                if parts.len() < 2 {
                    println!("Usage: analyze <tok1,tok2,...>");
                    continue;
                }
                let tokens: Vec<&str> = parts[1..]
                    .iter()
                    .flat_map(|p| p.split([',', '，']))
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect();
                match reader.analyze_session(&id, &tokens, AnalysisScope::All) {
                    Ok(report) => {
                        println!(
                            "Used {}/{} ({:.1}%)",
                            report.used_tokens.len(),
                            report.total_required,
                            report.usage_rate * 100.0
                        );
                        if !report.unused_tokens.is_empty() {
                            println!("Unused: {}", report.unused_tokens.join(" "));
                        }
                    }
                    Err(e) => println!("ERROR [{}]: {}", e.code(), e),
                }
            }
            "reload" => {
                reader.delete_session(&id).ok();
                let (new_id, view) = reader.open_chapter(&text);
                id = new_id;
                println!("New session {}", id);
                print_view(&view);
            }
            _ => println!("Unknown command: {}. Type 'help' for commands.", cmd),
        }
    }

    cleanup(&reader, &id);
}

fn cleanup(reader: &DialogueReader, id: &SessionId) {
    if let Ok(stats) = reader.stats(id) {
        println!("Read {}/{} segments.", stats.completed, stats.total);
    }
    reader.delete_session(id).ok();
}

fn report(result: Result<DialogueView, dialogue_reader::ReaderError>) {
    match result {
        Ok(view) => print_view(&view),
        Err(e) => println!("ERROR [{}]: {}", e.code(), e),
    }
}

fn print_view(view: &DialogueView) {
    let Some(ref segment) = view.segment else {
        println!("--- End ({}/{}) ---", view.completed, view.total);
        return;
    };
    let prompt = match view.cue {
        Cue::RequiresConfirmation => "(confirm)",
        Cue::AutoAdvance => "(next)",
        Cue::End => "",
    };
    println!(
        "[{:>5.1}%] {}：{} {}",
        view.progress_percentage, segment.speaker_name, segment.content, prompt
    );
}

fn print_usage() {
    println!("Usage: reader_shell --input <chapter.txt> [--config <classifier.ron>] [--loose]");
    println!();
    println!("  --input    chapter text to read");
    println!("  --config   classifier config (RON)");
    println!("  --loose    allow advancing past protagonist lines without confirming");
}

fn print_help() {
    println!("Commands:");
    println!("  view              show the current segment");
    println!("  next | n          advance, or confirm a waiting protagonist line");
    println!("  confirm | c       confirm the waiting protagonist line");
    println!("  advance | a       advance past a narration/character line");
    println!("  history [n]       show the last n lines read");
    println!("  stats             session statistics");
    println!("  analyze <t1,t2>   required-vocabulary report");
    println!("  reload            start the chapter over");
    println!("  help              this list");
    println!("  quit              exit");
}
