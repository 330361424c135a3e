//! Hexfront - headless host
//!
//! Runs a world simulation against the wall clock, reads console commands
//! from stdin and manages save files.

mod commands;
mod saves;
mod state;

use clap::{Args, Parser, Subcommand};
use hexfront_core::{GeneratorKind, Simulation, TerrainGenerator, TileGraph, WorldSettings};
use state::{CliError, Flow, Session};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Host loop frame length.
const FRAME: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "hexfront")]
#[command(about = "Real-time hex-grid strategy world simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a session, reading console commands from stdin
    Run(RunArgs),
    /// Print an ASCII terrain map
    Generate(MapArgs),
    /// Summarise a save file
    Inspect {
        /// Path to a save file
        path: PathBuf,
    },
    /// List saves in a directory
    Saves {
        #[arg(long, default_value = "saves")]
        save_dir: PathBuf,
        /// Delete this save instead of listing
        #[arg(long)]
        delete: Option<String>,
    },
}

#[derive(Args, Debug)]
struct MapArgs {
    /// JSON settings file; flags override its values
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Map width in tiles
    #[arg(long)]
    width: Option<u32>,

    /// Map height in tiles
    #[arg(long)]
    height: Option<u32>,

    /// Seed for terrain and simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Replace all water with land
    #[arg(long)]
    dry: bool,
}

impl MapArgs {
    fn settings(&self) -> Result<WorldSettings, CliError> {
        let mut settings = match &self.settings {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => WorldSettings::default(),
        };
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if self.dry {
            settings.generator = GeneratorKind::Dry;
        }
        Ok(settings)
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    map: MapArgs,

    /// Resume the save with this id instead of generating a world
    #[arg(long)]
    resume: Option<String>,

    /// Stop after this many days
    #[arg(long)]
    days: Option<u32>,

    /// Start in fast-forward
    #[arg(long)]
    fast: bool,

    /// Start paused
    #[arg(long)]
    paused: bool,

    /// Directory for save files
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Generate(args) => generate(&args),
        Command::Inspect { path } => inspect(&path),
        Command::Saves { save_dir, delete } => list_or_delete(&save_dir, delete.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "hexfront failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RunArgs) -> Result<(), CliError> {
    let sim = match &args.resume {
        Some(id) => {
            let data = saves::load_save(&args.save_dir, id)?;
            info!(id, name = %data.metadata.name, day = data.metadata.day, "resuming save");
            Simulation::from_snapshot(data.snapshot)?
        }
        None => Simulation::new(args.map.settings()?)?,
    };

    let mut session = Session::new(sim, args.save_dir);
    session.day_limit = args.days;
    session.sim.clock_mut().set_fast_forward(args.fast);
    session.sim.clock_mut().set_running(!args.paused);

    let (tx, mut rx) = mpsc::channel::<String>(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut ticker = interval(FRAME);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    let mut console_open = true;

    while !session.finished() {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let elapsed = now - last;
                last = now;
                if let Some((report, notices)) = session.frame(elapsed) {
                    for notice in notices {
                        println!("[day {}] {}", report.day, notice);
                    }
                }
            }
            line = rx.recv(), if console_open => match line {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match session.handle_line(&line) {
                    Ok(Flow::Continue(message)) => println!("{}", message),
                    Ok(Flow::Quit) => break,
                    Err(err) => println!("error: {}", err),
                },
                None => console_open = false,
            },
        }
    }

    info!(day = session.sim.day(), "session ended");
    Ok(())
}

fn generate(args: &MapArgs) -> Result<(), CliError> {
    let settings = args.settings()?;
    settings
        .validate()
        .map_err(|err| CliError::Simulation(err.into()))?;

    let mut graph = TileGraph::new(settings.width, settings.height);
    let report = TerrainGenerator::new(settings.seed, settings.generator).generate(&mut graph);
    println!("{}", graph.render_ascii());
    println!(
        "seed {}: {} coast, {} mountains in {} ranges, {} desert in {} deserts, {} dried",
        settings.seed,
        report.coast,
        report.mountains,
        report.mountain_ranges,
        report.desert_tiles,
        report.deserts,
        report.dried
    );
    Ok(())
}

fn inspect(path: &std::path::Path) -> Result<(), CliError> {
    let data = saves::read_save(path)?;
    let meta = &data.metadata;
    let snapshot = &data.snapshot;
    println!("{} '{}' saved {}", meta.id, meta.name, meta.saved_at);
    println!(
        "day {} on a {}x{} map, seed {}",
        snapshot.day, snapshot.settings.width, snapshot.settings.height, snapshot.settings.seed
    );
    for faction in &snapshot.factions {
        println!(
            "  {} {}: {} provinces, {} units",
            faction.id,
            faction.name,
            faction.provinces.len(),
            faction.units.len()
        );
    }
    Ok(())
}

fn list_or_delete(dir: &std::path::Path, delete: Option<&str>) -> Result<(), CliError> {
    if let Some(id) = delete {
        saves::delete_save(dir, id)?;
        println!("deleted {}", id);
        return Ok(());
    }
    for save in saves::list_saves(dir) {
        println!("{}  {}  day {}  {}", save.id, save.saved_at, save.day, save.name);
    }
    Ok(())
}
