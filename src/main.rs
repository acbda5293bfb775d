//! RDS decoder for demodulated bit streams and hex-format group dumps.
//!
//! Reads from stdin and writes one JSON record per decoded group to stdout:
//!
//! ```bash
//! # ASCII bit stream ('0'/'1') from a demodulator
//! fm-demod | fmrds
//!
//! # Hex-format groups, four words per line, "----" for lost blocks
//! fmrds --input hex < groups.txt
//!
//! # North American station with timestamps and BLER
//! fmrds --rbds --timestamp --bler
//! ```

use std::io::{stdin, stdout, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::warn;

use fmrds::error::Error;
use fmrds::{EventCatalog, JsonLinesSink, Options, Pipeline, RecordSink};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// ASCII '0'/'1' characters, MSB first (other bytes are ignored)
    Bits,
    /// Lines of four hex block words, "----" marking a lost block
    Hex,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "RDS group decoder: bit stream in, JSON records out", long_about = None)]
struct Args {
    /// Input format
    #[arg(long, value_enum, default_value = "bits")]
    input: InputFormat,

    /// Use North American (RBDS) programme types and derive callsigns
    #[arg(long)]
    rbds: bool,

    /// Attach a receive timestamp to every record
    #[arg(short, long)]
    timestamp: bool,

    /// Timestamp format (strftime-style)
    #[arg(long, default_value = "%Y-%m-%dT%H:%M:%S%.3f%:z")]
    time_format: String,

    /// Emit partial PS / RadioText / AF lists while they assemble
    #[arg(short = 'p', long)]
    show_partial: bool,

    /// Include raw block hex in every record
    #[arg(short = 'r', long)]
    show_raw: bool,

    /// Attach the running block error rate to every record
    #[arg(long)]
    bler: bool,

    /// Number of interleaved channels in the bit stream
    #[arg(long, default_value_t = 1)]
    channels: usize,

    /// TMC event catalog (';'-separated table)
    #[arg(long)]
    tmc_events: Option<PathBuf>,

    /// TMC supplementary information catalog (';'-separated table)
    #[arg(long)]
    tmc_suppl: Option<PathBuf>,

    /// Verbosity (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Parse a hex-format line: four whitespace-separated block words, with
/// `----` for blocks that were not received.
fn parse_hex_line(line: &str) -> Result<[Option<u16>; 4], Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() != 4 {
        return Err(Error::MalformedHexLine(line.to_string()));
    }

    let mut blocks = [None; 4];
    for (i, word) in words.iter().enumerate() {
        if *word == "----" {
            continue;
        }
        blocks[i] = Some(
            u16::from_str_radix(word, 16)
                .map_err(|_| Error::MalformedHexLine(line.to_string()))?,
        );
    }
    Ok(blocks)
}

fn main() -> fmrds::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .try_init();

    let options = Options {
        rbds: args.rbds,
        timestamp: args.timestamp,
        time_format: args.time_format.clone(),
        show_partial: args.show_partial,
        show_raw: args.show_raw,
        num_channels: args.channels.max(1),
        bler: args.bler,
        ..Options::default()
    };

    let tmc_catalog = match &args.tmc_events {
        Some(path) => Arc::new(EventCatalog::load(path, args.tmc_suppl.as_deref())?),
        None => Arc::new(EventCatalog::new()),
    };

    let mut pipelines: Vec<Pipeline> = (0..options.num_channels)
        .map(|channel| Pipeline::new(&options, channel, tmc_catalog.clone()))
        .collect();

    let mut sink = JsonLinesSink::new(stdout().lock());

    match args.input {
        InputFormat::Bits => read_bits(&mut pipelines, &mut sink)?,
        InputFormat::Hex => read_hex(&mut pipelines[0], &mut sink)?,
    }

    Ok(())
}

/// Drive the pipelines from an ASCII bit stream, round-robin across
/// channels for interleaved multi-channel input.
fn read_bits(pipelines: &mut [Pipeline], sink: &mut dyn RecordSink) -> fmrds::Result<()> {
    let stdin = stdin();
    let mut channel = 0;

    for line in stdin.lock().lines() {
        for byte in line?.bytes() {
            let bit = match byte {
                b'0' => false,
                b'1' => true,
                _ => continue,
            };
            pipelines[channel].push_bit(bit, sink);
            channel = (channel + 1) % pipelines.len();
        }
    }
    Ok(())
}

/// Drive a pipeline from hex-format group lines.
fn read_hex(pipeline: &mut Pipeline, sink: &mut dyn RecordSink) -> fmrds::Result<()> {
    let stdin = stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_hex_line(&line) {
            Ok(blocks) => pipeline.push_group(blocks, sink),
            Err(error) => warn!(%error, "skipping input line"),
        }
    }
    Ok(())
}
