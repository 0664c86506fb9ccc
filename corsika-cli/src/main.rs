//! CORSIKA raw file inspection CLI.
//!
//! Summarizes the block structure of a CORSIKA raw file and optionally
//! exports its particles to CSV.

use anyhow::{Context, Result};
use clap::Parser;
use corsika_core::{output, BlockKind, RawStream};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Reader for CORSIKA air-shower simulation raw output.
///
/// Walks every block of the file, reports run/event structure and can dump
/// all particles as CSV.
#[derive(Parser, Debug)]
#[command(name = "corsika-dump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CORSIKA raw file (e.g. DAT000001)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write all particles to this CSV file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Print one line per block
    #[arg(short, long)]
    blocks: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Block counts gathered in one pass.
#[derive(Debug, Default)]
struct Summary {
    blocks: usize,
    runs: usize,
    events: usize,
    particle_blocks: usize,
    longitudinal_blocks: usize,
    padding_blocks: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Setup progress bar
    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb
    };

    let start_time = Instant::now();
    progress.set_message(format!(
        "Reading {:?}...",
        args.input.file_name().unwrap_or_default()
    ));

    let mut stream = RawStream::open(&args.input).context("Failed to open CORSIKA file")?;
    let format = stream.format();
    info!(
        "{}: {:?} layout, {}-byte record markers",
        args.input.display(),
        format.layout,
        format.marker.bytes()
    );

    let mut summary = Summary::default();
    for block in stream.blocks() {
        let block = block.context("Failed to read block")?;
        let position = summary.blocks;
        summary.blocks += 1;

        match block.kind {
            BlockKind::RunHeader => summary.runs += 1,
            BlockKind::EventHeader => summary.events += 1,
            BlockKind::Longitudinal => summary.longitudinal_blocks += 1,
            BlockKind::ParticleData if block.is_padding() => summary.padding_blocks += 1,
            BlockKind::ParticleData => summary.particle_blocks += 1,
            BlockKind::RunEnd | BlockKind::EventEnd => {}
        }

        if args.blocks {
            let number = block.run_number().or(block.event_number());
            match number {
                Some(n) => progress.println(format!("{:6} {} #{}", position, block.kind, n)),
                None => progress.println(format!("{:6} {}", position, block.kind)),
            }
        }
        if summary.blocks % 1000 == 0 {
            progress.set_message(format!("Read {} blocks", summary.blocks));
        }
    }

    let mut particle_count = None;
    if let Some(output_path) = &args.output {
        progress.set_message(format!(
            "Writing particles to {:?}...",
            output_path.file_name().unwrap_or_default()
        ));

        stream.seek_to(0).context("Failed to rewind CORSIKA file")?;
        let count = output::write_particles_csv(output_path, format.layout, stream.particles())
            .context("Failed to write particle CSV")?;
        particle_count = Some(count);
    }

    stream.close().context("Failed to close CORSIKA file")?;
    let total_duration = start_time.elapsed();

    progress.finish_with_message(format!(
        "Done! Read {} blocks in {:.2}s",
        summary.blocks,
        total_duration.as_secs_f64()
    ));

    if !args.quiet {
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:            {:?}", args.input);
        eprintln!("  Layout:           {:?}", format.layout);
        eprintln!("  Record marker:    {} bytes", format.marker.bytes());
        eprintln!("  Blocks:           {}", summary.blocks);
        eprintln!("  Runs:             {}", summary.runs);
        eprintln!("  Events:           {}", summary.events);
        eprintln!("  Particle blocks:  {}", summary.particle_blocks);
        eprintln!("  LONG blocks:      {}", summary.longitudinal_blocks);
        eprintln!("  Padding blocks:   {}", summary.padding_blocks);
        if let (Some(path), Some(count)) = (&args.output, particle_count) {
            eprintln!("  Particles:        {} -> {:?}", count, path);
        }
        eprintln!("  Duration:         {:.3}s", total_duration.as_secs_f64());
    }

    Ok(())
}
