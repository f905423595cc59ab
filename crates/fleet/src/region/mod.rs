use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use common::log;

use crate::{
    config::WorldConstants,
    error::FleetError,
    unit::{NameGenerator, Role, UnitMemory},
    world::{Body, Position, SpawnResult, StructureId, StructureKind, UnitName, World, WorldSnapshot},
};

// ----------------------------------------------
// SpawnQueueEntry
// ----------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnQueueEntry {
    pub body: Body,
    pub name: UnitName,
    pub role: String,

    // Memory the unit starts with once materialized.
    pub memory: UnitMemory,
}

impl SpawnQueueEntry {
    pub fn new(body: Body, name: UnitName, role: Role, memory: UnitMemory) -> Self {
        Self { body, name, role: role.tag().to_string(), memory }
    }
}

// ----------------------------------------------
// SpawnQueue
// ----------------------------------------------

// Strict FIFO. The head is only removed once a factory accepted it.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnQueue {
    entries: VecDeque<SpawnQueueEntry>,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, entry: SpawnQueueEntry) {
        self.entries.push_back(entry);
    }

    #[inline]
    pub fn peek(&self) -> Option<&SpawnQueueEntry> {
        self.entries.front()
    }

    #[inline]
    pub fn peek_mut(&mut self) -> Option<&mut SpawnQueueEntry> {
        self.entries.front_mut()
    }

    #[inline]
    pub fn pop(&mut self) -> Option<SpawnQueueEntry> {
        self.entries.pop_front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SpawnQueueEntry> {
        self.entries.iter()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.entries.iter().any(|entry| entry.role == role.tag())
    }
}

// ----------------------------------------------
// RegionMemory
// ----------------------------------------------

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionMemory {
    pub spawn_queue: SpawnQueue,
}

#[derive(Default)]
pub struct RegionTickReport {
    pub spawned: Vec<UnitName>,
    pub errors: Vec<FleetError>,
}

impl RegionMemory {
    // Hands queued units to free factories, head first, until the queue empties,
    // no factory is free or the head cannot be materialized this tick.
    pub fn tick<W>(&mut self,
                   world: &mut W,
                   region: &str,
                   constants: &WorldConstants,
                   units: &mut BTreeMap<UnitName, UnitMemory>,
                   names: &mut NameGenerator) -> RegionTickReport
        where W: World
    {
        let mut report = RegionTickReport::default();

        loop {
            let Some(factory) = world.free_factory(region) else {
                break;
            };

            let Some(head) = self.spawn_queue.peek() else {
                break;
            };

            let result = world.spawn(factory, &head.body, &head.name);
            let cost = head.body.cost(constants);

            match result {
                SpawnResult::Ok => {
                    if let Some(entry) = self.spawn_queue.pop() {
                        log::verbose!(log::channel!("spawn"),
                                      "{factory} in '{region}' materializing '{}' ({}).", entry.name, entry.body);
                        report.spawned.push(entry.name.clone());
                        units.insert(entry.name, entry.memory);
                    }
                },
                SpawnResult::InsufficientResources => {
                    log::verbose!(log::channel!("spawn"),
                                  "'{region}' cannot afford '{}' yet (cost {cost}).", head.name);
                    report.errors.push(FleetError::InsufficientResources {
                        region: region.to_string(),
                        name: head.name.clone(),
                        cost,
                    });
                    break;
                },
                SpawnResult::Busy => {
                    break;
                },
                SpawnResult::NameExists => {
                    let tick = world.tick();
                    if let Some(head) = self.spawn_queue.peek_mut() {
                        let new_name = names.next(&head.role, tick);
                        log::warn!(log::channel!("spawn"),
                                   "Name '{}' already taken in '{region}'. Renaming to '{new_name}'.", head.name);
                        head.name = new_name;
                    }
                    break;
                },
                SpawnResult::InvalidBody => {
                    if let Some(entry) = self.spawn_queue.pop() {
                        log::error!(log::channel!("spawn"),
                                    "Factory rejected body {} of '{}' in '{region}'. Dropping it.", entry.body, entry.name);
                        report.errors.push(FleetError::InvalidBody {
                            region: region.to_string(),
                            name: entry.name,
                        });
                    }
                },
            }
        }

        report
    }
}

// ----------------------------------------------
// Deposit targets
// ----------------------------------------------

// Deposit candidates by priority class. The first class with free capacity wins.
pub const DEPOSIT_PRIORITY: [StructureKind; 3] = [
    StructureKind::Link.union(StructureKind::Factory).union(StructureKind::Extension),
    StructureKind::Tower,
    StructureKind::Storage,
];

// Nearest structure with free capacity in the highest priority class that has one.
pub fn find_storage_with_space<W>(world: &W, region: &str, from: Position) -> Option<StructureId>
    where W: WorldSnapshot
{
    DEPOSIT_PRIORITY.iter().find_map(|class| {
        world.structures_in(region)
            .filter(|structure| class.intersects(structure.kind) && structure.free_capacity() > 0)
            .min_by_key(|structure| (structure.pos.range_to(from), structure.id))
            .map(|structure| structure.id)
    })
}

#[cfg(test)]
mod tests;
