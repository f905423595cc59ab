use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use common::log;

use crate::{
    error::{FleetError, FleetResult},
    region::{RegionMemory, SpawnQueue},
    save::{self, SaveState},
    telemetry::TelemetryStore,
    unit::{NameGenerator, Role, UnitMemory},
    world::{NodeId, RegionName, Tick, UnitName, WorldSnapshot},
};

// ----------------------------------------------
// FleetMemory
// ----------------------------------------------

// Everything the engine must remember between ticks.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetMemory {
    pub regions: BTreeMap<RegionName, RegionMemory>,
    pub units: BTreeMap<UnitName, UnitMemory>,
    pub telemetry: TelemetryStore,
    pub names: NameGenerator,
}

impl FleetMemory {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next_unit_name(&mut self, role: Role, tick: Tick) -> UnitName {
        self.names.next(role.tag(), tick)
    }

    pub fn assigned_units(&self, node: NodeId) -> impl Iterator<Item = (&UnitName, &UnitMemory)> {
        self.units.iter().filter(move |(_, unit)| unit.assigned_node == Some(node))
    }

    // Units with `role` whose home is `region`.
    pub fn region_units<'a>(&'a self, region: &'a str, role: Role) -> impl Iterator<Item = (&'a UnitName, &'a UnitMemory)> {
        self.units.iter().filter(move |(_, unit)| unit.home == region && unit.has_role(role))
    }

    #[inline]
    pub fn spawn_queue(&self, region: &str) -> Option<&SpawnQueue> {
        self.regions.get(region).map(|region| &region.spawn_queue)
    }

    #[inline]
    pub fn spawn_queue_mut(&mut self, region: &str) -> &mut SpawnQueue {
        &mut self.regions.entry(region.to_string()).or_default().spawn_queue
    }

    #[inline]
    pub fn has_role_in_spawn_queue(&self, region: &str, role: Role) -> bool {
        self.spawn_queue(region).is_some_and(|queue| queue.has_role(role))
    }

    // ----------------------
    // Stale state cleanup:
    // ----------------------

    // Frees memory of units that vanished from the world. Units still being
    // materialized exist in the world and are kept.
    pub fn remove_stale_units<W>(&mut self, world: &W) -> Vec<UnitName>
        where W: WorldSnapshot
    {
        let stale: Vec<UnitName> = self.units.keys()
            .filter(|name| world.unit(name).is_none())
            .cloned()
            .collect();

        for name in &stale {
            self.units.remove(name);
            log::verbose!(log::channel!("controller"), "Freed memory of vanished unit '{name}'.");
        }

        stale
    }

    // Clears assignments to nodes that no longer exist or are outside the unit's region.
    pub fn clear_invalid_assignments<W>(&mut self, world: &W) -> Vec<FleetError>
        where W: WorldSnapshot
    {
        let mut errors = Vec::new();

        for (name, unit) in &mut self.units {
            let Some(node) = unit.assigned_node else {
                continue;
            };

            let valid = world.node(node).is_some_and(|info| info.region == unit.home);
            if !valid {
                log::warn!(log::channel!("controller"),
                           "'{name}' was assigned to {node} which is not a node of '{}'. Clearing it.", unit.home);
                unit.assigned_node = None;
                errors.push(FleetError::InvalidAssignment { unit: name.clone(), node });
            }
        }

        errors
    }

    // Drops telemetry of nodes gone from the world.
    pub fn remove_stale_telemetry<W>(&mut self, world: &W)
        where W: WorldSnapshot
    {
        self.telemetry.retain_nodes(|node| world.node(node).is_some());
    }

    // ----------------------
    // Save/Load:
    // ----------------------

    pub fn save_file<P>(&self, path: P) -> FleetResult<()>
        where P: AsRef<Path>
    {
        let path = path.as_ref();
        let mut state = save::backend::new_json_save_state(true);

        state.save(self).map_err(FleetError::Save)?;
        state.write_file(path).map_err(|err| FleetError::Save(format!("{path:?}: {err}")))?;

        log::info!(log::channel!("save"), "Saved fleet memory to {path:?} ({} units).", self.units.len());
        Ok(())
    }

    pub fn load_file<P>(path: P) -> FleetResult<Self>
        where P: AsRef<Path>
    {
        let path = path.as_ref();
        let mut state = save::backend::new_json_save_state(false);

        state.read_file(path).map_err(|err| FleetError::Save(format!("{path:?}: {err}")))?;
        let memory: Self = state.load_new_instance().map_err(FleetError::Save)?;

        log::info!(log::channel!("save"), "Loaded fleet memory from {path:?} ({} units).", memory.units.len());
        Ok(memory)
    }
}
