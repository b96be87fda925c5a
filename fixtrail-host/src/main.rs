//! fixtrail-replay: run a recorded track through the history engine.
//!
//! The track file is JSON lines, one position fix per line, in the same
//! format the engine persists (`latitude`, `longitude`, `accuracy`,
//! `time`). Significant movements are reported on stdout; state is
//! persisted the way a live host would persist it, so consecutive replays
//! resume from the stored history and marker.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use fixtrail_core::{
    AuthorizationSource, AuthorizationStatus, EngineConfig, HistoryEngine, LifecycleConfig,
    LifecycleController, PositionFix, SamplingDriver, SamplingMode, NO_MARKER_DISTANCE,
};
use fixtrail_host::FileStateStore;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AuthorizationArg {
    Denied,
    ForegroundOnly,
    Always,
}

impl From<AuthorizationArg> for AuthorizationStatus {
    fn from(arg: AuthorizationArg) -> Self {
        match arg {
            AuthorizationArg::Denied => AuthorizationStatus::Denied,
            AuthorizationArg::ForegroundOnly => AuthorizationStatus::ForegroundOnly,
            AuthorizationArg::Always => AuthorizationStatus::Always,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fixtrail-replay", about = "Replay a recorded track through the Fixtrail engine")]
struct Args {
    /// Track file: JSON lines, one position fix per line
    track: PathBuf,

    /// History buffer capacity
    #[arg(long, default_value_t = fixtrail_core::DEFAULT_CAPACITY)]
    capacity: usize,

    /// Significant-change threshold in meters
    #[arg(long, default_value_t = fixtrail_core::DEFAULT_THRESHOLD_METERS)]
    threshold: f64,

    /// State document path (defaults to the user data directory)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Simulated authorization level
    #[arg(long, value_enum, default_value = "always")]
    authorization: AuthorizationArg,

    /// Enter background before ingesting the fix with this 1-based index
    #[arg(long)]
    background_after: Option<usize>,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

/// Sampling driver that only logs requests; there is no real sensor here.
#[derive(Debug, Default)]
struct LoggingDriver;

impl SamplingDriver for LoggingDriver {
    fn set_mode(&mut self, mode: SamplingMode) {
        log::info!("sampling mode requested: {:?}", mode);
    }

    fn set_distance_filter(&mut self, meters: f64) {
        log::info!("distance filter requested: {} m", meters);
    }
}

struct StaticAuth {
    status: AuthorizationStatus,
}

impl AuthorizationSource for StaticAuth {
    fn status(&self) -> AuthorizationStatus {
        self.status
    }

    fn coarse_monitoring_available(&self) -> bool {
        true
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();

    let state_path = match args.state_file.clone() {
        Some(path) => path,
        None => FileStateStore::default_path()
            .context("could not determine a state directory; pass --state-file")?,
    };
    log::debug!("state document: {}", state_path.display());

    let store = FileStateStore::open(&state_path)?;
    let mut engine = HistoryEngine::new();
    engine.configure(
        EngineConfig {
            capacity: args.capacity,
            threshold_meters: args.threshold,
        },
        Box::new(store),
    )?;
    if let Some(marker) = engine.last_reported() {
        log::info!(
            "resuming with stored marker at {:.5}, {:.5}",
            marker.latitude,
            marker.longitude
        );
    }

    let mut controller = LifecycleController::new(LifecycleConfig::default());
    let mut driver = LoggingDriver;
    let auth = StaticAuth {
        status: args.authorization.into(),
    };

    let file = File::open(&args.track)
        .with_context(|| format!("failed to open track {}", args.track.display()))?;

    let mut ingested = 0usize;
    let mut significant = 0usize;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("failed to read track line")?;
        if line.trim().is_empty() {
            continue;
        }
        let fix: PositionFix = serde_json::from_str(&line)
            .with_context(|| format!("track line {} is not a position fix", index + 1))?;

        if args.background_after == Some(ingested + 1) {
            if let Some(err) = controller.on_enter_background(&auth, &mut driver, &mut engine) {
                log::warn!("flush on background transition failed: {}", err);
            }
        }

        let outcome = engine.ingest(fix)?;
        ingested += 1;
        if outcome.significant {
            significant += 1;
            if outcome.distance_meters == NO_MARKER_DISTANCE {
                println!(
                    "#{:<4} significant: first fix at {:.5}, {:.5}",
                    ingested, fix.latitude, fix.longitude
                );
            } else {
                println!(
                    "#{:<4} significant: moved {:.1} m to {:.5}, {:.5}",
                    ingested, outcome.distance_meters, fix.latitude, fix.longitude
                );
            }
        }
    }

    if ingested == 0 {
        bail!("track {} contained no fixes", args.track.display());
    }

    engine.flush_to_store()?;
    log::info!("state persisted to {}", state_path.display());

    println!(
        "replayed {} fixes, {} significant, {} in history",
        ingested,
        significant,
        engine.last_fixes(args.capacity)?.len()
    );
    Ok(())
}
