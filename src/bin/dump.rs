//! Dump tool for extracting the detected working buffer of a replay
//!
//! Usage: cargo run --bin dump <replay.rep> [output.bin]

use std::env;
use std::fs;
use std::process::ExitCode;

use bw_replay::config::DEFAULT_MAX_BUFFER_SIZE;
use bw_replay::detect;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <replay.rep> [output.bin]", args[0]);
        eprintln!("  If output.bin is not specified, writes to working.bin");
        return ExitCode::FAILURE;
    }

    let input_path = &args[1];
    let output_path = args.get(2).map_or("working.bin", String::as_str);

    eprintln!("Reading: {input_path}");
    let data = match fs::read(input_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to read input file: {e}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("File size: {} bytes", data.len());

    let detection = detect(&data, DEFAULT_MAX_BUFFER_SIZE);
    let descriptor = detection.descriptor;
    eprintln!("Compression: {:?}", descriptor.compression);
    eprintln!("Revision: {:?}", descriptor.revision);
    eprintln!("Section offset: 0x{:X}", descriptor.section_offset);
    eprintln!("Plausibility score: {}", descriptor.score);
    if !descriptor.is_recognized() {
        eprintln!("Warning: format not recognized, dumping the input unchanged");
    }
    eprintln!("Working buffer size: {} bytes", detection.buffer.len());

    if let Err(e) = fs::write(output_path, &detection.buffer) {
        eprintln!("Failed to write output file: {e}");
        return ExitCode::FAILURE;
    }
    eprintln!("Wrote to: {output_path}");
    ExitCode::SUCCESS
}
