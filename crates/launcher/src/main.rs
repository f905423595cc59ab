use std::path::PathBuf;

use clap::Parser;
use common::log;
use fleet::{
    FleetConfigs, FleetController, FleetMemory,
    config::RegionConfigs,
    sim::{SIM_DEFAULT_RANDOM_SEED, SimWorld},
    world::WorldSnapshot,
};

const DEFAULT_CONFIG_PATH: &str = "assets/configs/fleet.json";

// ----------------------------------------------
// Command Line
// ----------------------------------------------

#[derive(Parser)]
#[command(name = "fleet-sim")]
#[command(about = "Runs the fleet control loop against a simulated world")]
struct Args {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 3000)]
    ticks: u32,

    /// Path to the configs file (JSON). Defaults are used if missing.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Persisted fleet memory. Loaded on start if present and saved on exit.
    #[arg(long)]
    memory: Option<PathBuf>,

    /// Seed for the generated world layout.
    #[arg(long, default_value_t = SIM_DEFAULT_RANDOM_SEED)]
    seed: u64,

    /// Number of regions in the generated world.
    #[arg(long, default_value_t = 2)]
    regions: u32,

    /// Ticks between progress summaries.
    #[arg(long, default_value_t = 500)]
    report_interval: u32,
}

// ----------------------------------------------
// main()
// ----------------------------------------------

fn main() {
    let args = Args::parse();
    log::info!(log::channel!("launcher"), "fleet-sim {}", common::version());

    let mut configs = {
        if args.config.exists() {
            FleetConfigs::load_file(&args.config)
        } else {
            log::info!(log::channel!("launcher"), "No config file at {:?}. Using defaults.", args.config);
            FleetConfigs::default()
        }
    };
    configs.apply_log_settings();

    let mut world = SimWorld::generate(configs.world.clone(), args.seed, args.regions);

    // Generated regions without an explicit entry are managed with default settings.
    for region in world.regions() {
        configs.regions.entry(region.name.clone()).or_insert_with(RegionConfigs::default);
    }

    let memory = load_memory(args.memory.as_ref());
    let mut controller = FleetController::new(&configs, memory);

    let mut spawned = 0;
    let mut errors = 0;

    for _ in 0..args.ticks {
        let report = controller.tick(&mut world);
        spawned += report.spawned.len();
        errors += report.errors.len();

        if args.report_interval != 0 && report.tick % args.report_interval == 0 {
            let memory = controller.memory();
            log::info!(log::channel!("launcher"),
                       "Tick {}: {} units, {} queued, {} nodes with telemetry.",
                       report.tick,
                       memory.units.len(),
                       memory.regions.values().map(|region| region.spawn_queue.len()).sum::<usize>(),
                       memory.telemetry.node_count());
        }

        world.advance();
    }

    log::info!(log::channel!("launcher"),
               "Finished {} ticks: {spawned} units spawned, {errors} errors reported.", args.ticks);

    if let Some(path) = &args.memory {
        if let Err(err) = controller.memory().save_file(path) {
            log::error!(log::channel!("launcher"), "Failed to save fleet memory: {err}");
        }
    }
}

fn load_memory(path: Option<&PathBuf>) -> FleetMemory {
    let Some(path) = path.filter(|path| path.exists()) else {
        return FleetMemory::new();
    };

    FleetMemory::load_file(path).unwrap_or_else(|err| {
        log::error!(log::channel!("launcher"), "Failed to load fleet memory: {err}. Starting with empty memory.");
        FleetMemory::new()
    })
}
