use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use common::log;

use crate::{
    config::WorldConstants,
    constants::{SPAWN_TICKS_PER_SEGMENT, UNIT_LIFETIME_TICKS},
    world::{
        ActionResult, Body, BodyPart, NodeId, Position, RegionInfo, RegionName,
        ResourceNode, SpawnResult, Spawning, StructureId, StructureInfo,
        StructureKind, Tick, UnitInfo, UnitName, World, WorldSnapshot,
    },
};

// ----------------------------------------------
// Constants
// ----------------------------------------------

pub type RandomGenerator = Pcg64;

pub const SIM_DEFAULT_RANDOM_SEED: u64 = 0xF1EE7;

pub const REGION_SIZE: i32 = 50;
pub const FACTORY_STORE_CAPACITY: u32 = 300;
pub const EXTENSION_STORE_CAPACITY: u32 = 50;
pub const TOWER_STORE_CAPACITY: u32 = 1000;
pub const STORAGE_STORE_CAPACITY: u32 = 100_000;
pub const NODE_CAPACITY_PER_CYCLE: u32 = 3000;

// Factories slowly refill on their own while their region is short on energy.
const FACTORY_PASSIVE_REGEN: u32 = 1;

// Fatigue produced per loaded segment on each step, and recovered per move segment each tick.
const FATIGUE_PER_SEGMENT: u32 = 2;

// ----------------------------------------------
// SimWorld
// ----------------------------------------------

struct SimUnit {
    info: UnitInfo,
    fatigue: u32,
}

// Deterministic in-memory world. Actions apply immediately; `advance` steps
// regeneration, factories and unit lifetimes to the next tick.
pub struct SimWorld {
    constants: WorldConstants,
    tick: Tick,
    rng: RandomGenerator,
    next_id: u32,

    regions: BTreeMap<RegionName, RegionInfo>,
    nodes: BTreeMap<NodeId, ResourceNode>,
    structures: BTreeMap<StructureId, StructureInfo>,
    units: BTreeMap<UnitName, SimUnit>,
}

impl SimWorld {
    pub fn new(constants: WorldConstants) -> Self {
        Self::with_seed(constants, SIM_DEFAULT_RANDOM_SEED)
    }

    pub fn with_seed(constants: WorldConstants, seed: u64) -> Self {
        Self {
            constants,
            tick: 0,
            rng: RandomGenerator::seed_from_u64(seed),
            next_id: 1,
            regions: BTreeMap::new(),
            nodes: BTreeMap::new(),
            structures: BTreeMap::new(),
            units: BTreeMap::new(),
        }
    }

    // Random layout: every region gets a stocked factory, a few nodes and
    // extra structures according to its level.
    pub fn generate(constants: WorldConstants, seed: u64, region_count: u32) -> Self {
        let mut world = Self::with_seed(constants, seed);
        let center = Position::new(REGION_SIZE / 2, REGION_SIZE / 2);

        for index in 0..region_count {
            let name = format!("R{index}");
            let level = world.rng.random_range(1..=8);
            world.add_region(&name, level);

            let factory = world.add_structure(&name, StructureKind::Factory, center, FACTORY_STORE_CAPACITY);
            world.set_store(factory, FACTORY_STORE_CAPACITY);

            let extensions = ((level - 1) * 5).min(20);
            for _ in 0..extensions {
                let pos = world.random_position(center, 6);
                world.add_structure(&name, StructureKind::Extension, pos, EXTENSION_STORE_CAPACITY);
            }

            if level >= 3 {
                let pos = world.random_position(center, 4);
                world.add_structure(&name, StructureKind::Tower, pos, TOWER_STORE_CAPACITY);
            }

            if level >= 4 {
                let pos = world.random_position(center, 3);
                world.add_structure(&name, StructureKind::Storage, pos, STORAGE_STORE_CAPACITY);
            }

            let node_count = world.rng.random_range(1..=2);
            for _ in 0..node_count {
                let pos = world.random_position(center, REGION_SIZE / 2 - 3);
                world.add_node(&name, pos, NODE_CAPACITY_PER_CYCLE);
            }

            log::info!(log::channel!("sim"),
                       "Generated region '{name}' (level {level}, {node_count} nodes, {extensions} extensions).");
        }

        world
    }

    fn random_position(&mut self, center: Position, radius: i32) -> Position {
        Position::new(center.x + self.rng.random_range(-radius..=radius),
                      center.y + self.rng.random_range(-radius..=radius))
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ----------------------
    // Building the world:
    // ----------------------

    pub fn add_region(&mut self, name: &str, level: u32) {
        self.regions.insert(name.to_string(), RegionInfo {
            name: name.to_string(),
            level,
            owned: true,
            energy_available: 0,
            energy_capacity: 0,
        });
    }

    pub fn set_region_level(&mut self, name: &str, level: u32) {
        if let Some(region) = self.regions.get_mut(name) {
            region.level = level;
        }
    }

    pub fn add_node(&mut self, region: &str, pos: Position, capacity_per_cycle: u32) -> NodeId {
        let id = NodeId(self.next_id());
        self.nodes.insert(id, ResourceNode {
            id,
            region: region.to_string(),
            pos,
            capacity_per_cycle,
            regen_cycle_ticks: self.constants.regen_cycle_ticks,
            amount: capacity_per_cycle,
        });
        id
    }

    pub fn remove_node(&mut self, id: NodeId) -> bool {
        self.nodes.remove(&id).is_some()
    }

    pub fn add_structure(&mut self, region: &str, kind: StructureKind, pos: Position, store_capacity: u32) -> StructureId {
        let id = StructureId(self.next_id());
        self.structures.insert(id, StructureInfo {
            id,
            region: region.to_string(),
            kind,
            pos,
            store_used: 0,
            store_capacity,
            spawning: None,
        });
        self.refresh_region_energy();
        id
    }

    pub fn set_store(&mut self, id: StructureId, amount: u32) {
        if let Some(structure) = self.structures.get_mut(&id) {
            structure.store_used = amount.min(structure.store_capacity);
        }
        self.refresh_region_energy();
    }

    // Adds a fully materialized unit.
    pub fn add_unit(&mut self, name: &str, home: &str, pos: Position, body: Body) {
        let store_capacity = body.store_capacity(&self.constants);
        self.units.insert(name.to_string(), SimUnit {
            info: UnitInfo {
                name: name.to_string(),
                home: home.to_string(),
                pos,
                body,
                store_used: 0,
                store_capacity,
                ticks_to_live: UNIT_LIFETIME_TICKS,
                spawning: false,
            },
            fatigue: 0,
        });
    }

    pub fn set_unit_store(&mut self, name: &str, amount: u32) {
        if let Some(unit) = self.units.get_mut(name) {
            unit.info.store_used = amount.min(unit.info.store_capacity);
        }
    }

    pub fn remove_unit(&mut self, name: &str) -> bool {
        self.units.remove(name).is_some()
    }

    #[inline]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    // ----------------------
    // Stepping:
    // ----------------------

    pub fn advance(&mut self) {
        self.tick += 1;
        let tick = self.tick;

        for node in self.nodes.values_mut() {
            if node.regen_cycle_ticks != 0 && tick % node.regen_cycle_ticks == 0 {
                node.amount = node.capacity_per_cycle;
            }
        }

        let mut materialized = Vec::new();
        for structure in self.structures.values_mut() {
            if let Some(spawning) = &mut structure.spawning {
                spawning.remaining_ticks = spawning.remaining_ticks.saturating_sub(1);
                if spawning.remaining_ticks == 0 {
                    materialized.push(spawning.name.clone());
                    structure.spawning = None;
                }
            }
        }

        for name in materialized {
            if let Some(unit) = self.units.get_mut(&name) {
                unit.info.spawning = false;
                log::verbose!(log::channel!("sim"), "'{name}' materialized at {}.", unit.info.pos);
            }
        }

        self.units.retain(|name, unit| {
            if unit.info.spawning {
                return true;
            }

            let recovery = unit.info.body.count(BodyPart::Move) * FATIGUE_PER_SEGMENT;
            unit.fatigue = unit.fatigue.saturating_sub(recovery);

            unit.info.ticks_to_live = unit.info.ticks_to_live.saturating_sub(1);
            if unit.info.ticks_to_live == 0 {
                log::verbose!(log::channel!("sim"), "'{name}' reached the end of its lifetime.");
                return false;
            }
            true
        });

        self.passive_factory_regen();
        self.refresh_region_energy();
    }

    fn passive_factory_regen(&mut self) {
        for region in self.regions.values() {
            if region.energy_available >= FACTORY_STORE_CAPACITY {
                continue;
            }

            let factory = self.structures.values_mut().find(|structure| {
                structure.region == region.name
                    && structure.kind.contains(StructureKind::Factory)
                    && structure.free_capacity() > 0
            });

            if let Some(factory) = factory {
                factory.store_used += FACTORY_PASSIVE_REGEN.min(factory.free_capacity());
            }
        }
    }

    fn refresh_region_energy(&mut self) {
        for region in self.regions.values_mut() {
            let (available, capacity) = self.structures.values()
                .filter(|structure| structure.region == region.name
                                    && structure.kind.intersects(StructureKind::spawn_energy()))
                .fold((0, 0), |(available, capacity), structure| {
                    (available + structure.store_used, capacity + structure.store_capacity)
                });

            region.energy_available = available;
            region.energy_capacity = capacity;
        }
    }

    // Takes `amount` from the region's factories first, then its extensions.
    fn withdraw_spawn_energy(&mut self, region: &str, mut amount: u32) {
        for kind in [StructureKind::Factory, StructureKind::Extension] {
            for structure in self.structures.values_mut() {
                if amount == 0 {
                    return;
                }
                if structure.region == region && structure.kind.contains(kind) {
                    let taken = structure.store_used.min(amount);
                    structure.store_used -= taken;
                    amount -= taken;
                }
            }
        }
    }
}

// ----------------------------------------------
// WorldSnapshot / World
// ----------------------------------------------

impl WorldSnapshot for SimWorld {
    #[inline]
    fn tick(&self) -> Tick {
        self.tick
    }

    fn region(&self, name: &str) -> Option<&RegionInfo> {
        self.regions.get(name)
    }

    fn regions(&self) -> impl Iterator<Item = &RegionInfo> {
        self.regions.values()
    }

    fn node(&self, id: NodeId) -> Option<&ResourceNode> {
        self.nodes.get(&id)
    }

    fn nodes_in(&self, region: &str) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values().filter(move |node| node.region == region)
    }

    fn unit(&self, name: &str) -> Option<&UnitInfo> {
        self.units.get(name).map(|unit| &unit.info)
    }

    fn units(&self) -> impl Iterator<Item = &UnitInfo> {
        self.units.values().map(|unit| &unit.info)
    }

    fn structure(&self, id: StructureId) -> Option<&StructureInfo> {
        self.structures.get(&id)
    }

    fn structures_in(&self, region: &str) -> impl Iterator<Item = &StructureInfo> {
        self.structures.values().filter(move |structure| structure.region == region)
    }
}

impl World for SimWorld {
    fn harvest(&mut self, unit: &str, node: NodeId) -> ActionResult {
        let Some(unit) = self.units.get_mut(unit) else {
            return ActionResult::InvalidTarget;
        };
        let Some(node) = self.nodes.get_mut(&node) else {
            return ActionResult::InvalidTarget;
        };

        if unit.info.spawning {
            return ActionResult::Busy;
        }
        if !unit.info.pos.is_near_to(node.pos) {
            return ActionResult::NotInRange;
        }

        let power = unit.info.body.count(BodyPart::Harvest) * self.constants.harvest_power;
        if power == 0 {
            return ActionResult::NoBodyPart;
        }
        if node.amount == 0 {
            return ActionResult::NotEnoughResources;
        }
        if unit.info.free_capacity() == 0 {
            return ActionResult::Full;
        }

        let amount = power.min(node.amount).min(unit.info.free_capacity());
        node.amount -= amount;
        unit.info.store_used += amount;
        ActionResult::Ok
    }

    fn transfer(&mut self, unit: &str, target: StructureId) -> ActionResult {
        let Some(unit) = self.units.get_mut(unit) else {
            return ActionResult::InvalidTarget;
        };
        let Some(structure) = self.structures.get_mut(&target) else {
            return ActionResult::InvalidTarget;
        };

        if unit.info.spawning {
            return ActionResult::Busy;
        }
        if !unit.info.pos.is_near_to(structure.pos) {
            return ActionResult::NotInRange;
        }
        if unit.info.store_used == 0 {
            return ActionResult::NotEnoughResources;
        }
        if structure.free_capacity() == 0 {
            return ActionResult::Full;
        }

        let amount = unit.info.store_used.min(structure.free_capacity());
        unit.info.store_used -= amount;
        structure.store_used += amount;

        self.refresh_region_energy();
        ActionResult::Ok
    }

    fn move_to(&mut self, unit: &str, target: Position) -> ActionResult {
        let carry_capacity = self.constants.carry_capacity.max(1);
        let Some(unit) = self.units.get_mut(unit) else {
            return ActionResult::InvalidTarget;
        };

        if unit.info.spawning {
            return ActionResult::Busy;
        }
        if unit.info.body.count(BodyPart::Move) == 0 {
            return ActionResult::NoBodyPart;
        }
        if unit.fatigue > 0 {
            return ActionResult::Tired;
        }
        if unit.info.pos == target {
            return ActionResult::Ok;
        }

        // Empty carry segments weigh nothing.
        let loaded_carry = unit.info.store_used.div_ceil(carry_capacity);
        let weight = unit.info.body.count(BodyPart::Harvest) + loaded_carry;

        unit.info.pos = unit.info.pos.step_towards(target);
        unit.fatigue += weight * FATIGUE_PER_SEGMENT;
        ActionResult::Ok
    }

    fn spawn(&mut self, factory: StructureId, body: &Body, name: &str) -> SpawnResult {
        let Some(structure) = self.structures.get(&factory) else {
            return SpawnResult::Busy;
        };

        if !structure.kind.contains(StructureKind::Factory) || structure.spawning.is_some() {
            return SpawnResult::Busy;
        }
        if body.is_empty() || body.len() as u32 > self.constants.max_unit_size {
            return SpawnResult::InvalidBody;
        }
        if self.units.contains_key(name) {
            return SpawnResult::NameExists;
        }

        let region = structure.region.clone();
        let pos = structure.pos;
        let cost = body.cost(&self.constants);
        let available = self.regions.get(&region).map_or(0, |region| region.energy_available);

        if cost > available {
            return SpawnResult::InsufficientResources;
        }

        self.withdraw_spawn_energy(&region, cost);

        let remaining_ticks = body.len() as u32 * SPAWN_TICKS_PER_SEGMENT;
        if let Some(structure) = self.structures.get_mut(&factory) {
            structure.spawning = Some(Spawning { name: name.to_string(), remaining_ticks });
        }

        self.units.insert(name.to_string(), SimUnit {
            info: UnitInfo {
                name: name.to_string(),
                home: region,
                pos,
                body: body.clone(),
                store_used: 0,
                store_capacity: body.store_capacity(&self.constants),
                ticks_to_live: UNIT_LIFETIME_TICKS,
                spawning: true,
            },
            fatigue: 0,
        });

        self.refresh_region_energy();
        SpawnResult::Ok
    }
}

#[cfg(test)]
mod tests;
