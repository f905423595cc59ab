use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::{
    allocator::Allocator,
    config::FleetConfigs,
    error::{FleetError, FleetResult},
    telemetry::TelemetryStore,
    world::{NodeId, RegionName, Tick, UnitName, World, WorldSnapshot},
};

pub mod worker;
use worker::WorkerUnit;

// ----------------------------------------------
// Role
// ----------------------------------------------

// Persisted as a plain tag in unit memory; parsed back every tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Worker,
}

impl Role {
    #[inline]
    pub fn tag(self) -> &'static str {
        self.into()
    }
}

// ----------------------------------------------
// WorkerTask
// ----------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkerTask {
    Harvesting,
    Depositing,
}

// ----------------------------------------------
// UnitMemory
// ----------------------------------------------

// Durable per-unit state. The allocator owns `assigned_node`; the unit's own
// task machine owns the task and deposit fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitMemory {
    pub role: String,
    pub home: RegionName,
    pub assigned_node: Option<NodeId>,

    #[serde(default)]
    pub task: Option<WorkerTask>,

    // Valid only while depositing.
    #[serde(default)]
    pub deposit_start: Tick,
    #[serde(default)]
    pub deposit_amount: u32,
}

impl UnitMemory {
    pub fn new(role: Role, home: &str, assigned_node: Option<NodeId>) -> Self {
        Self {
            role: role.tag().to_string(),
            home: home.to_string(),
            assigned_node,
            task: None,
            deposit_start: 0,
            deposit_amount: 0,
        }
    }

    #[inline]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role.tag()
    }
}

// ----------------------------------------------
// NameGenerator
// ----------------------------------------------

// "{role}-{tick}-{sequence}". The sequence keeps names unique within a tick.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NameGenerator {
    sequence: u64,
}

impl NameGenerator {
    pub fn next(&mut self, role_tag: &str, tick: Tick) -> UnitName {
        let name = format!("{role_tag}-{tick}-{}", self.sequence);
        self.sequence += 1;
        name
    }
}

// ----------------------------------------------
// UnitContext
// ----------------------------------------------

pub struct UnitContext<'a, W> {
    pub name: &'a str,
    pub world: &'a mut W,
    pub configs: &'a FleetConfigs,
    pub allocator: &'a Allocator,
    pub telemetry: &'a mut TelemetryStore,
    pub memory: &'a mut UnitMemory,
}

// ----------------------------------------------
// UnitBehavior
// ----------------------------------------------

#[enum_dispatch(UnitArchetype)]
pub trait UnitBehavior {
    // Runs at most one state transition of the unit's task machine.
    fn tick<W: World>(&mut self, context: &mut UnitContext<'_, W>) -> FleetResult<()>;

    // Whether the unit must pick a new task before acting this tick.
    fn should_update_task<W: WorldSnapshot>(&self, context: &UnitContext<'_, W>) -> bool;
}

#[enum_dispatch]
pub enum UnitArchetype {
    Worker(WorkerUnit),
}

impl UnitArchetype {
    pub fn from_role(name: &str, role_tag: &str) -> FleetResult<Self> {
        match Role::from_str(role_tag) {
            Ok(Role::Worker) => Ok(WorkerUnit.into()),
            Err(_) => Err(FleetError::UnknownRole {
                unit: name.to_string(),
                role: role_tag.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests;
