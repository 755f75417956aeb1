//! Contagion Simulation Runner
//!
//! Spawns a demo population, seeds patient zero and runs the outbreak for a
//! fixed simulated duration, writing events and statistics as it goes.

use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use contagion_core::events::EventLogger;
use contagion_core::output::{write_stats, StatsCollector};
use contagion_core::setup::{random_walk, spawn_population};
use contagion_core::{DiseaseRegistry, SimConfig, Simulation};

/// Chance per frame that a living actor moves one tile
const MOVE_CHANCE: f64 = 0.3;
/// Chance per frame that an actor says something
const SPEAK_CHANCE: f64 = 0.02;
/// Seconds between carrier-count samples
const SAMPLE_INTERVAL: f64 = 10.0;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "contagion_sim")]
#[command(about = "Per-actor disease progression and spread simulation")]
struct Args {
    /// Random seed for reproducibility (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Engine tuning file
    #[arg(long, default_value = "tuning.toml")]
    config: PathBuf,

    /// Disease registry file
    #[arg(long, default_value = "data/diseases.toml")]
    registry: PathBuf,

    /// Simulated seconds to run (overrides the config file)
    #[arg(long)]
    duration: Option<f64>,

    /// Where to write the JSONL event log
    #[arg(long, default_value = "output/events.jsonl")]
    events_out: PathBuf,

    /// Where to write run statistics
    #[arg(long, default_value = "output/stats.json")]
    stats_out: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = if args.config.exists() {
        match SimConfig::from_file(&args.config) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %args.config.display(), error = %e, "invalid config");
                return ExitCode::FAILURE;
            }
        }
    } else {
        tracing::warn!(path = %args.config.display(), "config not found, using defaults");
        SimConfig::default()
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(duration) = args.duration {
        config.simulation.duration_seconds = duration;
    }

    let registry = match DiseaseRegistry::from_file(&args.registry) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!(path = %args.registry.display(), error = %e, "failed to load registry");
            return ExitCode::FAILURE;
        }
    };

    println!("Contagion Simulation");
    println!("====================");
    println!("Seed: {}", config.simulation.seed);
    println!("Duration: {}s", config.simulation.duration_seconds);
    println!("Diseases: {}", registry.len());
    println!();

    if let Some(parent) = args.events_out.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(error = %e, "could not create output directory");
        }
    }
    let mut logger = EventLogger::new(&args.events_out).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not open event log, discarding events");
        EventLogger::null()
    });

    // World layout uses its own stream so the engine's draws stay comparable
    let mut world_rng = SmallRng::seed_from_u64(config.simulation.seed.wrapping_add(1));
    let population = config.population.clone();
    let frame = config.simulation.frame_seconds.max(1e-3);
    let duration = config.simulation.duration_seconds.max(0.0);

    let mut sim = Simulation::new(config, registry);
    let summary = spawn_population(&mut sim, &population, &mut world_rng);
    println!(
        "Spawned {} actors ({} masked, {} wall tiles)",
        summary.actors.len(),
        summary.masked,
        summary.walls
    );

    let mut stats = StatsCollector::new();
    let mut next_sample = 0.0;
    while sim.now() < duration {
        random_walk(
            sim.world_mut(),
            population.width,
            population.height,
            MOVE_CHANCE,
            &mut world_rng,
        );
        for actor in &summary.actors {
            if world_rng.gen_bool(SPEAK_CHANCE) {
                sim.on_actor_spoke(*actor);
            }
        }

        sim.update(frame);

        let events = sim.drain_events();
        if let Err(e) = logger.log_batch(&events) {
            tracing::warn!(error = %e, "failed to write events");
        }
        stats.record_events(&events);

        if sim.now() >= next_sample {
            stats.sample(sim.world_mut());
            next_sample += SAMPLE_INTERVAL;
            let infected = summary
                .actors
                .iter()
                .filter(|actor| {
                    sim.diagnose(**actor)
                        .map(|snapshot| !snapshot.is_healthy())
                        .unwrap_or(false)
                })
                .count();
            tracing::info!(time = sim.now(), infected, "outbreak progress");
        }
    }

    if let Err(e) = logger.flush() {
        tracing::warn!(error = %e, "failed to flush event log");
    }

    let elapsed = sim.now();
    let outbreak = stats.finish(sim.world_mut(), elapsed);
    println!();
    println!("Simulation complete: {} events", outbreak.total_events);
    for (disease, disease_stats) in &outbreak.diseases {
        println!(
            "  {}: {} infections, {} cured, peak {} carriers",
            disease, disease_stats.infections, disease_stats.cures, disease_stats.peak_infected
        );
    }

    if let Err(e) = write_stats(&outbreak, &args.stats_out) {
        tracing::warn!(error = %e, "could not write stats");
    } else {
        println!("Wrote {}", args.stats_out.display());
    }

    ExitCode::SUCCESS
}
