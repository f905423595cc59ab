use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use common::bitflags_with_display;

use crate::{
    config::WorldConstants,
    constants::BODY_INLINE_CAPACITY,
};

// ----------------------------------------------
// Identities
// ----------------------------------------------

pub type Tick = u32;
pub type RegionName = String;
pub type UnitName = String;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureId(pub u32);

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "structure#{}", self.0)
    }
}

// ----------------------------------------------
// Position
// ----------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    // Chebyshev distance: diagonal steps cost the same as straight ones.
    #[inline]
    pub fn range_to(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    #[inline]
    pub fn is_near_to(self, other: Position) -> bool {
        self.range_to(other) <= 1
    }

    // One step towards `target`.
    #[inline]
    pub fn step_towards(self, target: Position) -> Position {
        Position::new(self.x + (target.x - self.x).signum(),
                      self.y + (target.y - self.y).signum())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

// ----------------------------------------------
// BodyPart / Body
// ----------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BodyPart {
    Harvest,
    Carry,
    Move,
}

// Ordered list of capability segments of a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body {
    parts: SmallVec<[BodyPart; BODY_INLINE_CAPACITY]>,
}

impl Body {
    #[inline]
    pub const fn new() -> Self {
        Self { parts: SmallVec::new_const() }
    }

    pub fn from_parts(parts: &[BodyPart]) -> Self {
        Self { parts: SmallVec::from_slice(parts) }
    }

    #[inline]
    pub fn push(&mut self, part: BodyPart) {
        self.parts.push(part);
    }

    #[inline]
    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[inline]
    pub fn count(&self, part: BodyPart) -> u32 {
        self.parts.iter().filter(|p| **p == part).count() as u32
    }

    pub fn cost(&self, constants: &WorldConstants) -> u32 {
        self.parts.iter().map(|part| constants.segment_cost(*part)).sum()
    }

    // Total resource the unit can hold.
    #[inline]
    pub fn store_capacity(&self, constants: &WorldConstants) -> u32 {
        self.count(BodyPart::Carry) * constants.carry_capacity
    }

    // Move segments per harvest segment. Zero for a body that cannot harvest.
    pub fn config_ratio(&self) -> f64 {
        let harvest = self.count(BodyPart::Harvest);
        if harvest == 0 {
            return 0.0;
        }
        self.count(BodyPart::Move) as f64 / harvest as f64
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}H/{}C/{}M",
               self.count(BodyPart::Harvest),
               self.count(BodyPart::Carry),
               self.count(BodyPart::Move))
    }
}

// ----------------------------------------------
// StructureKind
// ----------------------------------------------

bitflags_with_display! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StructureKind: u8 {
        const Factory   = 1 << 0;
        const Extension = 1 << 1;
        const Link      = 1 << 2;
        const Tower     = 1 << 3;
        const Storage   = 1 << 4;
    }
}

impl StructureKind {
    // Structures whose store counts towards the spawning budget.
    #[inline]
    pub const fn spawn_energy() -> Self {
        Self::Factory.union(Self::Extension)
    }
}

// ----------------------------------------------
// Entity snapshots
// ----------------------------------------------

#[derive(Clone, Debug)]
pub struct RegionInfo {
    pub name: RegionName,
    pub level: u32,
    pub owned: bool,

    // Resource available for spawning right now / at most.
    pub energy_available: u32,
    pub energy_capacity: u32,
}

#[derive(Clone, Debug)]
pub struct ResourceNode {
    pub id: NodeId,
    pub region: RegionName,
    pub pos: Position,
    pub capacity_per_cycle: u32,
    pub regen_cycle_ticks: u32,
    pub amount: u32,
}

#[derive(Clone, Debug)]
pub struct UnitInfo {
    pub name: UnitName,
    pub home: RegionName,
    pub pos: Position,
    pub body: Body,
    pub store_used: u32,
    pub store_capacity: u32,
    pub ticks_to_live: u32,

    // Still being materialized by a factory.
    pub spawning: bool,
}

impl UnitInfo {
    #[inline]
    pub fn free_capacity(&self) -> u32 {
        self.store_capacity.saturating_sub(self.store_used)
    }
}

#[derive(Clone, Debug)]
pub struct Spawning {
    pub name: UnitName,
    pub remaining_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct StructureInfo {
    pub id: StructureId,
    pub region: RegionName,
    pub kind: StructureKind,
    pub pos: Position,
    pub store_used: u32,
    pub store_capacity: u32,

    // Factories only.
    pub spawning: Option<Spawning>,
}

impl StructureInfo {
    #[inline]
    pub fn free_capacity(&self) -> u32 {
        self.store_capacity.saturating_sub(self.store_used)
    }
}

// ----------------------------------------------
// Action results
// ----------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum ActionResult {
    Ok,
    NotInRange,
    Full,
    NotEnoughResources,
    InvalidTarget,
    NoBodyPart,
    Tired,
    Busy,
}

impl ActionResult {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum SpawnResult {
    Ok,
    Busy,
    InsufficientResources,
    NameExists,
    InvalidBody,
}

// ----------------------------------------------
// WorldSnapshot
// ----------------------------------------------

// Read side of the world. Every read within one tick observes the same state,
// apart from the effects of actions issued earlier in that tick.
pub trait WorldSnapshot {
    fn tick(&self) -> Tick;

    fn region(&self, name: &str) -> Option<&RegionInfo>;
    fn regions(&self) -> impl Iterator<Item = &RegionInfo>;

    fn node(&self, id: NodeId) -> Option<&ResourceNode>;
    fn nodes_in(&self, region: &str) -> impl Iterator<Item = &ResourceNode>;

    fn unit(&self, name: &str) -> Option<&UnitInfo>;
    fn units(&self) -> impl Iterator<Item = &UnitInfo>;

    fn structure(&self, id: StructureId) -> Option<&StructureInfo>;
    fn structures_in(&self, region: &str) -> impl Iterator<Item = &StructureInfo>;

    // A factory in `region` that is not materializing a unit.
    fn free_factory(&self, region: &str) -> Option<StructureId> {
        self.structures_in(region)
            .find(|s| s.kind.contains(StructureKind::Factory) && s.spawning.is_none())
            .map(|s| s.id)
    }
}

// ----------------------------------------------
// World
// ----------------------------------------------

// Actions take effect immediately. At most one action of each kind per unit per tick.
pub trait World: WorldSnapshot {
    fn harvest(&mut self, unit: &str, node: NodeId) -> ActionResult;
    fn transfer(&mut self, unit: &str, target: StructureId) -> ActionResult;
    fn move_to(&mut self, unit: &str, target: Position) -> ActionResult;
    fn spawn(&mut self, factory: StructureId, body: &Body, name: &str) -> SpawnResult;
}
