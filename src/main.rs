//! Binary entrypoint: runs a slideshow against an in-memory surface so the
//! reveal timing can be watched in the logs.

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use tile_slideshow::config::Configuration;
use tile_slideshow::controls::parse_control;
use tile_slideshow::events::{self, ImageDescriptor, SlideshowEvent, SlideshowHandle};
use tile_slideshow::pattern::{self, Pattern};
use tile_slideshow::surface::MemorySurface;
use tile_slideshow::tasks::slideshow::{Slideshow, SlideshowOptions};

#[derive(Debug, Parser)]
#[command(
    name = "tile-slideshow",
    version,
    about = "Tiled background slideshow with staggered reveal patterns"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Override the configured reveal pattern (random, progressive, horizontal-sweep, vertical-sweep, corner)
    #[arg(long, value_name = "PRESET")]
    pattern: Option<Pattern>,
    /// Start with this image set instead of the configured one
    #[arg(long = "image-set", value_name = "INDEX")]
    image_set: Option<usize>,
    /// Stop after this many completed cycles
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,
    /// Deterministic RNG seed for the random pattern
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Print the per-cell ranks of the first N cycles without running
    #[arg(long = "pattern-dry-run", value_name = "CYCLES")]
    pattern_dry_run: Option<u64>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tile_slideshow={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        pattern,
        image_set,
        cycles,
        seed,
        pattern_dry_run,
        verbose,
    } = Args::parse();
    init_tracing(verbose);

    let mut cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?;
    if let Some(pattern) = pattern {
        cfg.pattern = pattern;
    }
    if let Some(idx) = image_set {
        cfg.active_image_set = idx;
    }
    if seed.is_some() {
        cfg.seed = seed;
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    info!(
        "Loaded configuration from {}:\n{:#?}",
        config.display(),
        cfg
    );

    if let Some(iterations) = pattern_dry_run {
        run_pattern_dry_run(&cfg, iterations);
        return Ok(());
    }

    let surface = MemorySurface::new(cfg.container.clone(), cfg.container_height);
    let (event_tx, mut event_rx) = mpsc::channel::<SlideshowEvent>(32);
    let mut slideshow = Slideshow::new(
        cfg.id,
        surface,
        cfg.active_images().to_vec(),
        SlideshowOptions::from(&cfg),
    )
    .context("failed to build slideshow")?
    .with_events(event_tx);
    slideshow.start();

    let (handle, command_rx) = events::channel(16);
    let cancel = CancellationToken::new();
    let show = tokio::spawn(slideshow.run(command_rx, cancel.clone()));

    if io::stdin().is_terminal() {
        info!("controls: pause | resume | interval <dur> | transition <dur> | step <dur> | pattern <preset> | set <index>");
    }
    spawn_control_reader(handle, cfg.image_sets.clone());

    let mut completed = 0u64;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.context("failed to listen for ctrl-c")?;
                info!("interrupted");
                break;
            }
            event = event_rx.recv() => match event {
                Some(SlideshowEvent::CycleCompleted { cycle, current, next }) => {
                    completed += 1;
                    info!(cycle, current, next, "cycle completed");
                    if cycles.is_some_and(|limit| completed >= limit) {
                        break;
                    }
                }
                Some(_) => {}
                None => break,
            },
        }
    }

    cancel.cancel();
    show.await.context("slideshow task panicked")??;
    Ok(())
}

/// Reads control lines on a dedicated thread; blocking stdin would otherwise
/// hold the runtime open at shutdown.
fn spawn_control_reader(handle: SlideshowHandle, image_sets: Vec<Vec<ImageDescriptor>>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_control(&line, &image_sets) {
                Ok(Some(command)) => {
                    if handle.blocking_send(command).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => warn!("{:#}", err),
            }
        }
    });
}

fn run_pattern_dry_run(cfg: &Configuration, iterations: u64) {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let shape = cfg.grid;
    for cycle in 0..iterations {
        let resolved = cfg.pattern.resolve(cycle);
        let ranks = pattern::generate(shape.cells(), &resolved, shape, &mut rng);
        println!("cycle {} ({:?}):", cycle, resolved);
        for row in ranks.chunks(shape.columns) {
            let line: Vec<String> = row.iter().map(|rank| format!("{:>4}", rank)).collect();
            println!("{}", line.join(""));
        }
    }
}
