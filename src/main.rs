use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use avatar_puppeteer::{
    PuppetConfig, Puppeteer, SessionStats,
    pipeline::{
        ClockMode, FrameClock, Pacing, RecordingSource, run_driver_loop, start_landmark_stream,
    },
};
use clap::Parser;
use crossbeam_channel::bounded;

/// Replay a landmark recording through the gesture classifier and rig damper.
#[derive(Debug, Parser)]
#[command(name = "avatar-puppeteer", version)]
struct Args {
    /// JSON-lines recording, one landmark frame per line.
    #[arg(required_unless_present = "dump_config")]
    recording: Option<PathBuf>,

    /// TOML file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write one JSON snapshot per tick to this file ("-" for stdout).
    #[arg(long)]
    emit: Option<PathBuf>,

    /// Replay as fast as possible, timing ticks from the recorded timestamps.
    #[arg(long)]
    unpaced: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PuppetConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PuppetConfig::default(),
    };

    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let Some(recording) = args.recording.as_deref() else {
        anyhow::bail!("no recording given");
    };
    let source = RecordingSource::open(recording)?;
    let mut emitter = open_emitter(args.emit.as_ref())?;

    let interval = config.driver.frame_interval();
    let (pacing, clock_mode, gap_timeout) = if args.unpaced {
        (Pacing::Unpaced, ClockMode::Recorded, None)
    } else {
        (Pacing::Realtime, ClockMode::Wall, Some(config.driver.gap_timeout()))
    };

    let (frame_tx, frame_rx) = bounded(1);
    let stream = start_landmark_stream(source, frame_tx, pacing, interval);

    let mut puppeteer = Puppeteer::new(&config);
    let mut clock = FrameClock::new(clock_mode, interval, config.driver.max_dt);

    run_driver_loop(&frame_rx, &mut puppeteer, &mut clock, gap_timeout, |snapshot| {
        if let Some(out) = emitter.as_mut() {
            serde_json::to_writer(&mut *out, snapshot)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    })?;

    stream.stop();
    if let Some(mut out) = emitter {
        out.flush().context("failed to flush snapshot output")?;
    }

    print_summary(puppeteer.stats());
    Ok(())
}

fn open_emitter(target: Option<&PathBuf>) -> Result<Option<Box<dyn Write>>> {
    let Some(path) = target else {
        return Ok(None);
    };
    if path.as_os_str() == "-" {
        return Ok(Some(Box::new(BufWriter::new(io::stdout()))));
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create snapshot output {}", path.display()))?;
    Ok(Some(Box::new(BufWriter::new(file))))
}

fn print_summary(stats: &SessionStats) {
    log::info!(
        "processed {} frames, {} idle ticks, {} settle ticks",
        stats.frames,
        stats.idle_ticks,
        stats.advance_ticks
    );
    eprintln!("frames: {}", stats.frames);
    eprintln!("idle ticks: {}", stats.idle_ticks);
    for (label, count) in &stats.label_frames {
        eprintln!("  {}{}: {count}", label.emoji(), label.display_name());
    }
}
