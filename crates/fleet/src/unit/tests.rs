use super::*;

use crate::{
    config::WorldConstants,
    sim::SimWorld,
    telemetry::DepositRecord,
    world::{Body, BodyPart, Position, StructureId, StructureKind},
};

// ----------------------------------------------
// Test helpers
// ----------------------------------------------

struct Harness {
    world: SimWorld,
    node: NodeId,
    factory: StructureId,
    memory: UnitMemory,
    telemetry: TelemetryStore,
    configs: FleetConfigs,
    allocator: Allocator,
}

impl Harness {
    // Node at [10,10], empty factory at [12,10] and a 1H/1C/1M worker at `unit_pos`.
    fn new(unit_pos: Position) -> Self {
        let mut world = SimWorld::new(WorldConstants::default());
        world.add_region("W1", 1);
        let node = world.add_node("W1", Position::new(10, 10), 3000);
        let factory = world.add_structure("W1", StructureKind::Factory, Position::new(12, 10), 300);
        world.add_unit("u", "W1", unit_pos,
                       Body::from_parts(&[BodyPart::Harvest, BodyPart::Carry, BodyPart::Move]));

        Self {
            world,
            node,
            factory,
            memory: UnitMemory::new(Role::Worker, "W1", Some(node)),
            telemetry: TelemetryStore::new(),
            configs: FleetConfigs::default(),
            allocator: Allocator::new(),
        }
    }

    fn context(&mut self) -> UnitContext<'_, SimWorld> {
        UnitContext {
            name: "u",
            world: &mut self.world,
            configs: &self.configs,
            allocator: &self.allocator,
            telemetry: &mut self.telemetry,
            memory: &mut self.memory,
        }
    }

    fn tick(&mut self) -> FleetResult<()> {
        let mut unit = UnitArchetype::from_role("u", "worker").unwrap();
        let result = unit.tick(&mut self.context());
        self.world.advance();
        result
    }

    fn store_used(&self) -> u32 {
        self.world.unit("u").unwrap().store_used
    }
}

// ----------------------------------------------
// Roles / names
// ----------------------------------------------

#[test]
fn test_role_tags() {
    assert_eq!(Role::Worker.tag(), "worker");
    assert_eq!(Role::Worker.to_string(), "worker");
    assert!(UnitArchetype::from_role("u", "worker").is_ok());

    match UnitArchetype::from_role("u", "hauler") {
        Err(FleetError::UnknownRole { unit, role }) => {
            assert_eq!(unit, "u");
            assert_eq!(role, "hauler");
        },
        _ => panic!("Expected an unknown role error!"),
    }
}

#[test]
fn test_name_generator() {
    let mut names = NameGenerator::default();
    assert_eq!(names.next("worker", 12), "worker-12-0");
    assert_eq!(names.next("worker", 12), "worker-12-1");
    assert_eq!(names.next("worker", 13), "worker-13-2");
}

#[test]
fn test_unit_memory_serde() {
    let memory = UnitMemory::new(Role::Worker, "W1", Some(NodeId(4)));
    let json = serde_json::to_string(&memory).unwrap();
    let loaded: UnitMemory = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, memory);

    // Task fields are optional in stored memory.
    let loaded: UnitMemory = serde_json::from_str(r#"{"role":"worker","home":"W1","assigned_node":null}"#).unwrap();
    assert_eq!(loaded.task, None);
    assert!(loaded.has_role(Role::Worker));
}

// ----------------------------------------------
// Worker task machine
// ----------------------------------------------

#[test]
fn test_should_update_task() {
    let mut harness = Harness::new(Position::new(11, 10));

    assert!(WorkerUnit.should_update_task(&harness.context()));

    harness.memory.task = Some(WorkerTask::Harvesting);
    assert!(!WorkerUnit.should_update_task(&harness.context()));

    harness.world.set_unit_store("u", 50);
    assert!(WorkerUnit.should_update_task(&harness.context()));

    harness.memory.task = Some(WorkerTask::Depositing);
    assert!(!WorkerUnit.should_update_task(&harness.context()));
}

#[test]
fn test_full_round_trip_records_telemetry() {
    let mut harness = Harness::new(Position::new(11, 10));

    // 2 per tick fills 50 in 25 ticks.
    for _ in 0..25 {
        harness.tick().unwrap();
        assert_eq!(harness.memory.task, Some(WorkerTask::Harvesting));
    }
    assert_eq!(harness.store_used(), 50);

    // Full at the start of the tick: deposit begins and the load is handed over.
    harness.tick().unwrap();
    assert_eq!(harness.memory.task, Some(WorkerTask::Depositing));
    assert_eq!(harness.memory.deposit_start, 25);
    assert_eq!(harness.memory.deposit_amount, 50);
    assert_eq!(harness.store_used(), 0);
    assert!(harness.world.structure(harness.factory).unwrap().store_used >= 50);

    // Empty at the start of the next tick: round trip complete.
    harness.tick().unwrap();
    assert_eq!(harness.memory.task, Some(WorkerTask::Harvesting));
    assert_eq!(harness.memory.assigned_node, None);

    let records: Vec<DepositRecord> = harness.telemetry.history(harness.node).copied().collect();
    assert_eq!(records, vec![DepositRecord { elapsed: 1, amount: 50, config_ratio: 1.0 }]);
}

#[test]
fn test_full_storage_on_arrival_is_not_recorded() {
    let mut harness = Harness::new(Position::new(11, 10));
    harness.world.set_store(harness.factory, 300);
    harness.world.set_unit_store("u", 50);
    harness.memory.task = Some(WorkerTask::Harvesting);

    // Starts depositing and finds no storage with space within the same tick.
    harness.tick().unwrap();
    assert_eq!(harness.memory.task, Some(WorkerTask::Harvesting));
    assert!(harness.telemetry.is_empty(harness.node));
    assert_eq!(harness.memory.assigned_node, Some(harness.node));
    assert_eq!(harness.store_used(), 50);
}

#[test]
fn test_walks_to_node() {
    let mut harness = Harness::new(Position::new(20, 10));

    harness.tick().unwrap();
    assert_eq!(harness.memory.task, Some(WorkerTask::Harvesting));
    assert_eq!(harness.world.unit("u").unwrap().pos, Position::new(19, 10));
    assert_eq!(harness.store_used(), 0);
}

#[test]
fn test_idle_worker_stays_harvesting() {
    let mut harness = Harness::new(Position::new(11, 10));
    harness.memory.assigned_node = None;

    for _ in 0..3 {
        harness.tick().unwrap();
        assert_eq!(harness.memory.task, Some(WorkerTask::Harvesting));
    }
    assert_eq!(harness.store_used(), 0);
    assert_eq!(harness.telemetry.node_count(), 0);
}

#[test]
fn test_vanished_node_clears_assignment() {
    let mut harness = Harness::new(Position::new(11, 10));
    let node = harness.node;
    harness.world.remove_node(node);

    let result = harness.tick();
    assert_eq!(result, Err(FleetError::InvalidAssignment { unit: "u".to_string(), node }));
    assert_eq!(harness.memory.assigned_node, None);
}
