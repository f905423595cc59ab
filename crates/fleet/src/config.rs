use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use common::log;

use crate::{
    constants::FULL_DEVELOPMENT_LEVEL,
    save::{self, SaveState},
    world::BodyPart,
};

// ----------------------------------------------
// FleetConfigs
// ----------------------------------------------

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)] // Missing fields in the config file get defaults from FleetConfigs::default().
pub struct FleetConfigs {
    // World rules the engine plans against:
    pub world: WorldConstants,

    // Sizing model tunables:
    pub allocator: AllocatorConfigs,

    // Managed regions. A region without an entry here is left alone.
    pub regions: BTreeMap<String, RegionConfigs>,

    // Logging:
    pub log_level: log::Level,
    pub log_tty_colors: bool,
    pub log_source_location: bool,
}

impl Default for FleetConfigs {
    fn default() -> Self {
        Self { world: WorldConstants::default(),
               allocator: AllocatorConfigs::default(),
               regions: BTreeMap::new(),
               log_level: log::Level::Info,
               log_tty_colors: true,
               log_source_location: false }
    }
}

impl FleetConfigs {
    // Either succeeds loading the config file or returns a default config.
    pub fn load_file<P>(path: P) -> Self
        where P: AsRef<Path>
    {
        let path = path.as_ref();
        let mut state = save::backend::new_json_save_state(false);

        if let Err(err) = state.read_file(path) {
            log::error!(log::channel!("config"), "Failed to read config file from path {path:?}: {err}");
            return Self::default();
        }

        match state.load_new_instance::<Self>() {
            Ok(configs) => {
                log::info!(log::channel!("config"), "Loaded configs from {path:?} ({} managed regions).", configs.regions.len());
                configs
            },
            Err(err) => {
                log::error!(log::channel!("config"), "Failed to deserialize config file from path {path:?}: {err}");
                Self::default()
            }
        }
    }

    // Saves current configs to file.
    pub fn save_file<P>(&self, path: P) -> bool
        where P: AsRef<Path>
    {
        let path = path.as_ref();
        let mut state = save::backend::new_json_save_state(true);

        if let Err(err) = state.save(self) {
            log::error!(log::channel!("config"), "Failed to save config file {path:?}: {err}");
            return false;
        }

        if let Err(err) = state.write_file(path) {
            log::error!(log::channel!("config"), "Failed to write config file {path:?}: {err}");
            return false;
        }

        true
    }

    pub fn apply_log_settings(&self) {
        log::set_level(self.log_level);
        log::enable_tty_colors(self.log_tty_colors);
        log::enable_source_location(self.log_source_location);
    }

    #[inline]
    pub fn region(&self, name: &str) -> Option<&RegionConfigs> {
        self.regions.get(name)
    }

    pub fn with_region(mut self, name: &str, harvest_ratio: f64) -> Self {
        self.regions.insert(name.to_string(), RegionConfigs { harvest_ratio });
        self
    }
}

// ----------------------------------------------
// Sub Config Categories
// ----------------------------------------------

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConstants {
    // Resource extracted per harvest segment per tick.
    pub harvest_power: u32,

    // Resource held per carry segment.
    pub carry_capacity: u32,

    // Maximum number of segments in a single unit.
    pub max_unit_size: u32,

    // Ticks between full resource node regenerations.
    pub regen_cycle_ticks: u32,

    // Segment build costs:
    pub harvest_segment_cost: u32,
    pub carry_segment_cost: u32,
    pub move_segment_cost: u32,
}

impl WorldConstants {
    #[inline]
    pub fn segment_cost(&self, part: BodyPart) -> u32 {
        match part {
            BodyPart::Harvest => self.harvest_segment_cost,
            BodyPart::Carry   => self.carry_segment_cost,
            BodyPart::Move    => self.move_segment_cost,
        }
    }

    // Harvest time of a body with one harvest segment per carry segment,
    // as used by the body synthesizer.
    #[inline]
    pub fn harvest_time(&self) -> f64 {
        self.harvest_power as f64 / self.carry_capacity.max(1) as f64
    }
}

impl Default for WorldConstants {
    fn default() -> Self {
        Self { harvest_power: 2,
               carry_capacity: 50,
               max_unit_size: 50,
               regen_cycle_ticks: 300,
               harvest_segment_cost: 100,
               carry_segment_cost: 50,
               move_segment_cost: 50 }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfigs {
    // Desired harvest time : deposit time ratio for newly synthesized units.
    pub target_harvest_deposit_ratio: f64,

    // Move segments per harvest segment used while telemetry cannot support a curve fit.
    pub default_config_ratio: f64,

    // Bounds on the synthesized move ratio. 2 moves per pair (1:1 with non-move
    // segments) already gives full speed on plain terrain.
    pub max_config_ratio: f64,
    pub min_config_ratio: f64,

    // Regions below this level harvest proportionally less.
    pub full_development_level: u32,
}

impl Default for AllocatorConfigs {
    fn default() -> Self {
        Self { target_harvest_deposit_ratio: 1.0,
               default_config_ratio: 1.0,
               max_config_ratio: 2.0,
               min_config_ratio: 0.25,
               full_development_level: FULL_DEVELOPMENT_LEVEL }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfigs {
    // Fraction of each node's per-cycle capacity to extract, in [0,1].
    pub harvest_ratio: f64,
}

impl Default for RegionConfigs {
    fn default() -> Self {
        Self { harvest_ratio: 1.0 }
    }
}
