//! Faction War
//!
//! Runs the hero/villain faction war against a populated sandbox world and
//! tears everything down when the tick count is reached or on Ctrl-C.

use catalog::Catalog;
use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use war_core::config::{default_config_toml, DEFAULT_CONFIG_PATH};
use war_core::{DiagnosticLog, HostWorld, ProcessLoop, SandboxWorld, TickOutcome, WarConfig, WarTransition};
use war_events::Position;

/// Models spawned alongside catalog archetypes that no faction claims
const CIVILIAN_MODELS: [u32; 3] = [0x0000_C1A1, 0x0000_C1A2, 0x0000_C1A3];

/// Command line arguments for the faction war
#[derive(Parser, Debug)]
#[command(name = "faction_war")]
#[command(about = "Hero and villain faction war over a sandbox world")]
struct Args {
    /// Configuration file (defaults are used if the default path is missing)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Archetype catalog, overriding the configured path
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of cycles to run; 0 runs until Ctrl-C
    #[arg(long, default_value_t = 120)]
    ticks: u64,

    /// Milliseconds between cycles, overriding the configured interval
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Agents spawned around the player
    #[arg(long, default_value_t = 24)]
    population: usize,

    /// Diagnostic JSONL log, overriding the configured path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml());
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: could not load {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging.level);

    match run(&args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<WarConfig, Box<dyn Error>> {
    let mut config = if args.config.exists() {
        WarConfig::from_file(&args.config)?
    } else if args.config == Path::new(DEFAULT_CONFIG_PATH) {
        WarConfig::default()
    } else {
        return Err(format!("{} does not exist", args.config.display()).into());
    };

    if let Some(path) = &args.catalog {
        config.catalog.path = path.clone();
    }
    if let Some(seed) = args.seed {
        config.process.seed = seed;
    }
    if let Some(interval) = args.interval_ms {
        config.process.tick_interval_ms = interval;
    }
    if let Some(path) = &args.log_file {
        config.logging.diagnostic_log = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn run(args: &Args, config: WarConfig) -> Result<(), Box<dyn Error>> {
    println!("Faction War");
    println!("===========");
    println!("Seed: {}", config.process.seed);
    println!("Ticks: {}", if args.ticks == 0 { "until Ctrl-C".to_string() } else { args.ticks.to_string() });
    println!("Interval: {}ms", config.process.tick_interval_ms);
    println!();

    let archetypes = Catalog::load(&config.catalog.path, config.catalog.expected_count)?;
    let log = match &config.logging.diagnostic_log {
        Some(path) => DiagnosticLog::new(path)?,
        None => DiagnosticLog::null(),
    };
    info!(run_id = %log.run_id(), "Diagnostic log ready");

    let mut world = SandboxWorld::new();
    let origin = Position::default();
    world.spawn_player(origin);
    let mut models = archetypes.hashes();
    models.extend(CIVILIAN_MODELS);
    let mut spawn_rng = SmallRng::seed_from_u64(config.process.seed.wrapping_add(2));
    let spawned = world.populate(&mut spawn_rng, origin, config.sampler.scan_radius, args.population, &models);
    println!("Spawned {} agents from {} models", spawned.len(), models.len());

    let tick_interval = config.process.tick_interval();
    let mut process = ProcessLoop::new(&config, archetypes, log);
    if let WarTransition::Activated { relationships_established: false } = process.activate(&mut world) {
        info!("Relationships will be retried on the next activation");
    }

    let mut interval = tokio::time::interval(tick_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut engagements = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                world.step(tick_interval);
                if let TickOutcome::Ran(report) = process.tick(&mut world) {
                    engagements += report.combat.engagements();
                }
                if args.ticks > 0 && process.cycles() >= args.ticks {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    let stats = process.engine().combat_stats(&world);
    let transition = process.deactivate(&mut world);

    println!();
    println!("Cycles: {}", process.cycles());
    println!("Engagements issued: {}", engagements);
    println!(
        "Fighting at shutdown: {} heroes, {} villains of {} registered",
        stats.active_heroes, stats.active_villains, stats.total_registered
    );
    if let WarTransition::Deactivated { destroyed, faults } = transition {
        println!("Destroyed {} agents ({} faults)", destroyed, faults);
    }
    println!("Events logged: {}", process.log().event_count());
    println!("Host time: {:.1}s", world.now().as_secs_f32());
    Ok(())
}
