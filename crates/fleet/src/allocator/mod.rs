use std::collections::HashSet;

use common::log;

use crate::{
    config::FleetConfigs,
    error::FleetError,
    memory::FleetMemory,
    region::SpawnQueueEntry,
    unit::{Role, UnitMemory},
    world::{NodeId, RegionName, ResourceNode, UnitName, WorldSnapshot},
};

pub mod curve;
pub mod estimate;
pub mod synth;

use estimate::NodeEstimator;

// Fraction of each node's capacity a region harvests, scaled down for regions
// that have not reached `full_development_level` yet.
pub fn scaled_harvest_ratio(harvest_ratio: f64, level: u32, full_development_level: u32) -> f64 {
    let development = (level as f64 / full_development_level.max(1) as f64).min(1.0);
    harvest_ratio.clamp(0.0, 1.0) * development
}

// ----------------------------------------------
// Allocator
// ----------------------------------------------

// Sizes the harvesting workforce of each node. Sole writer of unit assignments.
// Holds no allocation state of its own; everything it decides from is either in
// the world snapshot or in `FleetMemory`.
pub struct Allocator {
    // Regions already reported as unmanaged.
    unmanaged_regions: HashSet<RegionName>,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    pub fn new() -> Self {
        Self { unmanaged_regions: HashSet::new() }
    }

    pub fn tick<W>(&mut self, world: &W, configs: &FleetConfigs, memory: &mut FleetMemory) -> Vec<FleetError>
        where W: WorldSnapshot
    {
        let mut errors = Vec::new();

        for region in world.regions().filter(|region| region.owned) {
            let Some(region_configs) = configs.region(&region.name) else {
                if self.unmanaged_regions.insert(region.name.clone()) {
                    log::warn!(log::channel!("allocator"),
                               "Region '{}' has no allocation configs. Leaving it unmanaged.", region.name);
                    errors.push(FleetError::ConfigurationMissing { region: region.name.clone() });
                }
                continue;
            };

            let harvest_ratio = scaled_harvest_ratio(region_configs.harvest_ratio,
                                                     region.level,
                                                     configs.allocator.full_development_level);

            self.allocate_harvesters(world, configs, memory, &region.name, harvest_ratio);
        }

        errors
    }

    pub fn allocate_harvesters<W>(&self,
                                  world: &W,
                                  configs: &FleetConfigs,
                                  memory: &mut FleetMemory,
                                  region: &str,
                                  harvest_ratio: f64)
        where W: WorldSnapshot
    {
        for node in world.nodes_in(region) {
            let target_energy = node.capacity_per_cycle as f64 * harvest_ratio;
            self.remove_excess_harvesters(world, configs, memory, node, target_energy);
            self.add_required_harvesters(world, configs, memory, node, target_energy);
        }
    }

    // Unassigns the most productive units first, stopping before the estimate
    // would drop below `min_energy`. Returns the per-cycle extraction removed.
    pub fn remove_excess_harvesters<W>(&self,
                                       world: &W,
                                       configs: &FleetConfigs,
                                       memory: &mut FleetMemory,
                                       node: &ResourceNode,
                                       min_energy: f64) -> f64
        where W: WorldSnapshot
    {
        let estimate = estimate::estimated_extraction_per_cycle(world, configs, memory, node);
        let excess = estimate - min_energy;
        if excess <= 0.0 {
            return 0.0;
        }

        let estimator = NodeEstimator::new(node, configs, &memory.telemetry);
        let assigned = ranked_units(world, &estimator, memory.assigned_units(node.id));

        let mut removed = 0.0;
        for (name, per_cycle) in assigned {
            if removed + per_cycle > excess {
                break;
            }
            if let Some(unit) = memory.units.get_mut(&name) {
                self.unassign(&name, unit);
                removed += per_cycle;
            }
        }

        if removed > 0.0 {
            log::verbose!(log::channel!("allocator"),
                          "{}: removed {removed:.0}/cycle of {excess:.0}/cycle excess.", node.id);
        }

        removed
    }

    // Assigns idle units of the node's region, most productive first, until the
    // shortfall is covered. Whatever remains is queued as one new unit.
    // Returns the name of the queued unit, if any.
    pub fn add_required_harvesters<W>(&self,
                                      world: &W,
                                      configs: &FleetConfigs,
                                      memory: &mut FleetMemory,
                                      node: &ResourceNode,
                                      min_energy: f64) -> Option<UnitName>
        where W: WorldSnapshot
    {
        let estimate = estimate::estimated_extraction_per_cycle(world, configs, memory, node);
        let needed = min_energy - estimate;
        if needed <= 0.0 {
            return None;
        }

        let estimator = NodeEstimator::new(node, configs, &memory.telemetry);
        let idle = ranked_units(
            world,
            &estimator,
            memory.region_units(&node.region, Role::Worker)
                .filter(|(_, unit)| unit.assigned_node.is_none()));

        let mut added = 0.0;
        for (name, per_cycle) in idle {
            if added >= needed {
                break;
            }
            if per_cycle <= 0.0 {
                continue;
            }
            if let Some(unit) = memory.units.get_mut(&name) {
                self.assign(&name, unit, node.id);
                added += per_cycle;
            }
        }

        let shortfall = needed - added;
        if shortfall <= 0.0 {
            return None;
        }

        if !estimator.has_telemetry() {
            log::verbose!(log::channel!("allocator"),
                          "{}: no reliable estimate yet, assuming harvest:deposit ratio {:.2}.",
                          node.id, configs.allocator.target_harvest_deposit_ratio);
        }

        let max_capacity = shortfall / node.regen_cycle_ticks.max(1) as f64;
        // Sized for the energy the region holds now, not its full capacity.
        let budget = world.region(&node.region).map_or(0, |region| region.energy_available);
        let samples = memory.telemetry.samples(node.id);

        let body = synth::synthesize_body(&configs.world, &configs.allocator, &samples, max_capacity, budget);
        if body.is_empty() {
            return None;
        }

        let name = memory.next_unit_name(Role::Worker, world.tick());
        log::verbose!(log::channel!("allocator"),
                      "{}: short {shortfall:.0}/cycle. Queuing '{name}' ({body}) in '{}'.",
                      node.id, node.region);

        let entry = SpawnQueueEntry::new(
            body,
            name.clone(),
            Role::Worker,
            UnitMemory::new(Role::Worker, &node.region, Some(node.id)));

        memory.spawn_queue_mut(&node.region).push(entry);
        Some(name)
    }

    #[inline]
    pub fn assign(&self, name: &str, unit: &mut UnitMemory, node: NodeId) {
        log::verbose!(log::channel!("allocator"), "Assigning '{name}' to {node}.");
        unit.assigned_node = Some(node);
    }

    #[inline]
    pub fn unassign(&self, name: &str, unit: &mut UnitMemory) {
        if let Some(node) = unit.assigned_node.take() {
            log::verbose!(log::channel!("allocator"), "Unassigning '{name}' from {node}.");
        }
    }
}

// Units paired with their per-cycle extraction at the estimator's node,
// sorted most productive first. Units not present in the world are left out.
fn ranked_units<'m, W, I>(world: &W, estimator: &NodeEstimator, units: I) -> Vec<(UnitName, f64)>
    where W: WorldSnapshot,
          I: Iterator<Item = (&'m UnitName, &'m UnitMemory)>
{
    let mut ranked: Vec<(UnitName, f64)> = units
        .filter_map(|(name, _)| {
            world.unit(name).map(|info| (name.clone(), estimator.per_cycle(&info.body)))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
