//! Brood War replay (.rep) decoder CLI
//!
//! A command-line interface for parsing, validating, and summarizing replay files.
//!
//! ## Commands
//!
//! - `info` - Display quick replay metadata
//! - `parse` - Parse replay with output format options
//! - `validate` - Validate replay format (exit codes for scripting)
//! - `batch` - Process multiple replays from a directory

use bw_replay::{ErrorKind, ExtractionResult, ParseOptions, ParserError, ReplayParser};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;

/// Brood War replay (.rep) decoder
#[derive(Parser)]
#[command(name = "bw-replay")]
#[command(about = "Brood War replay (.rep) decoder", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file with parse options
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log stage decisions to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display replay information
    Info {
        /// Path to the replay file
        file: PathBuf,
    },
    /// Parse a replay file
    Parse {
        /// Path to the replay file
        file: PathBuf,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
        /// Print decoded commands (pretty output only)
        #[arg(long)]
        commands: bool,
    },
    /// Validate replay format
    Validate {
        /// Path to the replay file
        file: PathBuf,
        /// Verbose error reporting
        #[arg(short = 'd', long)]
        details: bool,
    },
    /// Parse multiple replay files
    Batch {
        /// Directory containing replay files
        directory: PathBuf,
        /// Output directory for JSON files
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Generate summary report
        #[arg(long)]
        summary: bool,
        /// Continue on errors
        #[arg(long)]
        continue_on_error: bool,
    },
}

/// Output format options
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Serialize, Default)]
struct BatchSummary {
    total_files: usize,
    successful: usize,
    failed: usize,
    commands_resolved: usize,
    total_events: usize,
    strategy_distribution: Vec<(String, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    average_duration_ms: Option<u64>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let parser = match build_parser(cli.config.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code(e.kind());
        }
    };

    match cli.command {
        Commands::Info { file } => cmd_info(&parser, &file),
        Commands::Parse {
            file,
            output,
            commands,
        } => cmd_parse(&parser, &file, &output, commands),
        Commands::Validate { file, details } => cmd_validate(&parser, &file, details),
        Commands::Batch {
            directory,
            output,
            summary,
            continue_on_error,
        } => cmd_batch(&parser, &directory, output.as_deref(), summary, continue_on_error),
    }
}

/// Initializes stderr logging; `RUST_LOG` overrides the default level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn build_parser(config: Option<&Path>) -> Result<ReplayParser, ParserError> {
    let options = match config {
        Some(path) => ParseOptions::from_json_file(path)?,
        None => ParseOptions::default(),
    };
    ReplayParser::new(options)
}

fn read_and_parse(parser: &ReplayParser, file: &Path) -> Result<ExtractionResult, ParserError> {
    let data = std::fs::read(file)?;
    parser.parse(&data)
}

/// Maps an error kind to a process exit code.
fn exit_code(kind: ErrorKind) -> ExitCode {
    ExitCode::from(match kind {
        ErrorKind::Io | ErrorKind::OutOfBounds | ErrorKind::Decompression => 1,
        ErrorKind::BufferEmptyOrTooLarge => 2,
        ErrorKind::InvalidConfig => 3,
        ErrorKind::FormatUnrecognized => 4,
        ErrorKind::HeaderFieldUnresolved => 5,
        ErrorKind::PlayerTableUnresolved => 6,
        ErrorKind::CommandStreamUnresolved => 7,
        ErrorKind::CommandStreamTruncated => 8,
    })
}

// ============================================================================
// Info Command Implementation
// ============================================================================

fn cmd_info(parser: &ReplayParser, file: &Path) -> ExitCode {
    let result = match read_and_parse(parser, file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code(e.kind());
        }
    };

    println!("=== Replay Information ===\n");
    println!("File:");
    println!("  Path: {}", file.display());
    println!("  Compression: {:?}", result.descriptor.compression);
    println!("  Revision: {:?}", result.descriptor.revision);
    println!();

    let header = &result.header;
    println!("Game:");
    println!("  Map: {}", header.map_name.as_deref().unwrap_or("unknown"));
    println!("  Duration: {}", header.duration.as_deref().unwrap_or("unknown"));
    if let Some(title) = &header.title {
        println!("  Title: {title}");
    }
    if let Some(speed) = header.game_speed {
        println!("  Speed: {speed:?}");
    }
    if let Some(game_type) = header.game_type {
        println!("  Type: {game_type:?}");
    }
    println!();

    println!("Players:");
    if result.players.is_empty() {
        println!("  (unresolved)");
    }
    for player in &result.players {
        println!(
            "  - {} ({:?}, team {}, {})",
            player.name,
            player.race,
            player.team,
            player.color.unwrap_or("no colour")
        );
    }
    println!();

    println!("Commands:");
    println!("  Strategy: {}", result.strategy);
    println!("  Reliability: {:?}", result.reliability);
    println!("  Events: {}", result.event_count);

    ExitCode::SUCCESS
}

// ============================================================================
// Parse Command Implementation
// ============================================================================

fn cmd_parse(parser: &ReplayParser, file: &Path, output: &OutputFormat, commands: bool) -> ExitCode {
    let result = match read_and_parse(parser, file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code(e.kind());
        }
    };

    match output {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Pretty => print_pretty(&result, commands),
    }

    ExitCode::SUCCESS
}

fn print_json(result: &ExtractionResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing to JSON: {e}"),
    }
}

fn print_pretty(result: &ExtractionResult, commands: bool) {
    let header = &result.header;
    println!("=== Header ===");
    println!("Map: {}", header.map_name.as_deref().unwrap_or("unknown"));
    if let Some(frames) = header.frame_count {
        println!(
            "Frames: {} ({})",
            frames,
            header.duration.as_deref().unwrap_or("?")
        );
    }
    if let Some(host) = &header.host_name {
        println!("Host: {host}");
    }
    if let (Some(w), Some(h)) = (header.map_width, header.map_height) {
        println!("Map size: {w}x{h}");
    }
    println!();

    println!("=== Players ({}) ===", result.players.len());
    for player in &result.players {
        println!(
            "  Slot {} [id {}]: {} ({:?})",
            player.slot, player.player_id, player.name, player.race
        );
    }
    println!();

    println!(
        "=== Commands: {} via {} ({:?}) ===",
        result.event_count, result.strategy, result.reliability
    );
    match &result.metrics {
        Some(metrics) => {
            for m in metrics {
                println!("\nPlayer {}:", m.player_id);
                println!("  APM: {}", m.apm);
                println!("  EAPM: {}", m.eapm);
                for count in &m.breakdown {
                    println!("  {}: {}", count.name, count.count);
                }
            }
        }
        None => println!("Metrics: unavailable"),
    }
    println!();

    for order in &result.build_orders {
        println!("=== Build Order: {} ===", order.name);
        for entry in &order.entries {
            let cap = entry
                .supply_cap
                .map_or_else(String::new, |cap| format!("/{cap}"));
            println!("  {:>6}  {:>3}{:<4}  {}", entry.time, entry.supply, cap, entry.name);
        }
        println!();
    }

    if commands {
        // Only show first 50 commands to avoid spam
        let display_count = std::cmp::min(result.events.len(), 50);
        println!("=== Commands ({}) ===", result.events.len());
        for event in &result.events[..display_count] {
            println!("  {event}");
        }
        if result.events.len() > 50 {
            println!("  ... and {} more commands", result.events.len() - 50);
        }
        println!();
    }

    if !result.issues.is_empty() {
        println!("=== Issues ===");
        for issue in &result.issues {
            println!("  - {}", issue.message);
        }
    }
}

// ============================================================================
// Validate Command Implementation
// ============================================================================

fn cmd_validate(parser: &ReplayParser, file: &Path, details: bool) -> ExitCode {
    let result = match read_and_parse(parser, file) {
        Ok(r) => r,
        Err(e) => {
            println!("{}: INVALID ({e})", file.display());
            return exit_code(e.kind());
        }
    };

    // Unresolved header fields are reported but do not fail validation
    let failure = result
        .issues
        .iter()
        .find(|issue| issue.kind != ErrorKind::HeaderFieldUnresolved);

    if details {
        print_validation_details(&result, file);
    } else {
        let status = if failure.is_none() { "VALID" } else { "INVALID" };
        println!("{}: {}", file.display(), status);
    }

    match failure {
        Some(issue) => exit_code(issue.kind),
        None => ExitCode::SUCCESS,
    }
}

fn print_validation_details(result: &ExtractionResult, file: &Path) {
    let failed = |kind: ErrorKind| result.issues.iter().any(|i| i.kind == kind);

    println!("Validating: {}\n", file.display());
    println!("Checks:");
    println!(
        "  Format detection:  {}",
        status_icon(!failed(ErrorKind::FormatUnrecognized))
    );
    println!(
        "  Player table:      {}",
        status_icon(!failed(ErrorKind::PlayerTableUnresolved))
    );
    println!(
        "  Command stream:    {}",
        status_icon(result.commands_resolved() && !failed(ErrorKind::CommandStreamTruncated))
    );

    let warnings: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.kind == ErrorKind::HeaderFieldUnresolved)
        .collect();
    let errors: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.kind != ErrorKind::HeaderFieldUnresolved)
        .collect();

    if !errors.is_empty() {
        println!("\nErrors:");
        for error in errors {
            println!("  - {}", error.message);
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in warnings {
            println!("  - {}", warning.message);
        }
    }

    println!("\nReliability: {:?} ({})", result.reliability, result.strategy);
}

fn status_icon(valid: bool) -> &'static str {
    if valid {
        "[OK]"
    } else {
        "[FAIL]"
    }
}

// ============================================================================
// Batch Command Implementation
// ============================================================================

fn cmd_batch(
    parser: &ReplayParser,
    directory: &Path,
    output_dir: Option<&Path>,
    summary: bool,
    continue_on_error: bool,
) -> ExitCode {
    let replays = find_replays(directory);

    if replays.is_empty() {
        eprintln!("No .rep files found in {}", directory.display());
        return ExitCode::FAILURE;
    }

    eprintln!("Found {} replay files", replays.len());

    if let Some(dir) = output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create output directory: {e}");
            return ExitCode::FAILURE;
        }
    }

    let mut report = BatchSummary {
        total_files: replays.len(),
        ..BatchSummary::default()
    };
    let mut durations: Vec<u64> = Vec::new();

    for replay in &replays {
        eprint!(
            "Processing {}... ",
            replay.file_name().unwrap_or_default().to_string_lossy()
        );

        match process_replay(parser, replay, output_dir) {
            Ok(result) => {
                eprintln!("OK ({})", result.strategy);
                report.successful += 1;
                report.total_events += result.event_count;
                if result.commands_resolved() {
                    report.commands_resolved += 1;
                }
                if let Some(ms) = result.header.duration_ms {
                    durations.push(ms);
                }
                match report
                    .strategy_distribution
                    .iter_mut()
                    .find(|(tag, _)| *tag == result.strategy)
                {
                    Some((_, count)) => *count += 1,
                    None => report
                        .strategy_distribution
                        .push((result.strategy.to_string(), 1)),
                }
            }
            Err(e) => {
                eprintln!("ERROR: {e}");
                report.failed += 1;
                if !continue_on_error {
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    eprintln!(
        "\nProcessed: {} success, {} errors",
        report.successful, report.failed
    );

    if summary {
        report.strategy_distribution.sort();
        if !durations.is_empty() {
            report.average_duration_ms =
                Some(durations.iter().sum::<u64>() / durations.len() as u64);
        }
        print_summary(&report, output_dir);
    }

    ExitCode::SUCCESS
}

fn find_replays(directory: &Path) -> Vec<PathBuf> {
    let mut replays = Vec::new();

    if let Ok(entries) = std::fs::read_dir(directory) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("rep"))
            {
                replays.push(path);
            }
        }
    }

    replays.sort();
    replays
}

fn process_replay(
    parser: &ReplayParser,
    replay: &Path,
    output_dir: Option<&Path>,
) -> Result<ExtractionResult, String> {
    let result = read_and_parse(parser, replay).map_err(|e| e.to_string())?;

    if let Some(dir) = output_dir {
        let output_file = dir
            .join(replay.file_stem().unwrap_or_default())
            .with_extension("json");
        let content = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
        std::fs::write(&output_file, content).map_err(|e| e.to_string())?;
    }

    Ok(result)
}

fn print_summary(summary: &BatchSummary, output_dir: Option<&Path>) {
    println!("\n=== Batch Summary ===");
    println!("Files processed: {}", summary.total_files);
    println!("Successful: {}", summary.successful);
    println!("Failed: {}", summary.failed);
    println!("Commands resolved: {}", summary.commands_resolved);
    println!("Total events: {}", summary.total_events);

    println!("\nStrategy distribution:");
    for (strategy, count) in &summary.strategy_distribution {
        println!("  {strategy}: {count}");
    }

    if let Some(avg) = summary.average_duration_ms {
        let minutes = avg / 60000;
        let seconds = (avg % 60000) / 1000;
        println!("\nAverage duration: {minutes:02}:{seconds:02}");
    }

    if let Some(dir) = output_dir {
        let summary_file = dir.join("summary.json");
        if let Ok(json) = serde_json::to_string_pretty(summary) {
            if std::fs::write(&summary_file, json).is_ok() {
                println!("\nSummary written to: {}", summary_file.display());
            }
        }
    }
}
