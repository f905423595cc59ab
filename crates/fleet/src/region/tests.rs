use super::*;

use crate::{
    sim::SimWorld,
    world::{BodyPart, NodeId},
};

fn entry(name: &str, pairs: usize) -> SpawnQueueEntry {
    let mut body = Body::new();
    for _ in 0..pairs {
        body.push(BodyPart::Harvest);
        body.push(BodyPart::Carry);
        body.push(BodyPart::Move);
    }
    SpawnQueueEntry::new(body, name.to_string(), Role::Worker, UnitMemory::new(Role::Worker, "W1", Some(NodeId(1))))
}

fn world_with_factories(factories: usize, energy: u32) -> SimWorld {
    let mut world = SimWorld::new(WorldConstants::default());
    world.add_region("W1", 4);
    for i in 0..factories {
        let factory = world.add_structure("W1", StructureKind::Factory, Position::new(20 + i as i32 * 5, 20), 1000);
        world.set_store(factory, energy);
    }
    world
}

struct Drain {
    units: BTreeMap<UnitName, UnitMemory>,
    names: NameGenerator,
}

impl Drain {
    fn new() -> Self {
        Self { units: BTreeMap::new(), names: NameGenerator::default() }
    }

    fn run(&mut self, region: &mut RegionMemory, world: &mut SimWorld) -> RegionTickReport {
        region.tick(world, "W1", &WorldConstants::default(), &mut self.units, &mut self.names)
    }
}

#[test]
fn test_queue_is_fifo() {
    let mut queue = SpawnQueue::new();
    assert!(queue.peek().is_none());
    assert!(!queue.has_role(Role::Worker));

    queue.push(entry("a", 1));
    queue.push(entry("b", 1));
    queue.push(entry("c", 1));

    assert!(queue.has_role(Role::Worker));
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.peek().map(|e| e.name.as_str()), Some("a"));
    assert_eq!(queue.pop().map(|e| e.name), Some("a".to_string()));
    assert_eq!(queue.pop().map(|e| e.name), Some("b".to_string()));
    assert_eq!(queue.pop().map(|e| e.name), Some("c".to_string()));
    assert!(queue.is_empty());
}

#[test]
fn test_drain_stops_when_factories_are_busy() {
    let mut world = world_with_factories(1, 1000);
    let mut region = RegionMemory::default();
    region.spawn_queue.push(entry("a", 1));
    region.spawn_queue.push(entry("b", 1));

    let mut drain = Drain::new();
    let report = drain.run(&mut region, &mut world);

    assert_eq!(report.spawned, vec!["a"]);
    assert!(report.errors.is_empty());
    assert_eq!(region.spawn_queue.peek().map(|e| e.name.as_str()), Some("b"));

    // The unit starts with the memory it was queued with.
    assert_eq!(drain.units["a"].assigned_node, Some(NodeId(1)));
    assert!(world.unit("a").unwrap().spawning);
}

#[test]
fn test_drain_uses_every_free_factory() {
    let mut world = world_with_factories(2, 1000);
    let mut region = RegionMemory::default();
    region.spawn_queue.push(entry("a", 1));
    region.spawn_queue.push(entry("b", 1));
    region.spawn_queue.push(entry("c", 1));

    let mut drain = Drain::new();
    let report = drain.run(&mut region, &mut world);

    assert_eq!(report.spawned, vec!["a", "b"]);
    assert_eq!(region.spawn_queue.len(), 1);
}

#[test]
fn test_insufficient_resources_keeps_head() {
    // 600 energy: the 4 segment-set head costs 800, the entry behind it only 200.
    let mut world = world_with_factories(1, 600);
    let mut region = RegionMemory::default();
    region.spawn_queue.push(entry("big", 4));
    region.spawn_queue.push(entry("small", 1));

    let mut drain = Drain::new();
    let report = drain.run(&mut region, &mut world);

    assert!(report.spawned.is_empty());
    assert_eq!(report.errors, vec![FleetError::InsufficientResources {
        region: "W1".to_string(),
        name: "big".to_string(),
        cost: 800,
    }]);
    assert_eq!(region.spawn_queue.len(), 2);
    assert_eq!(region.spawn_queue.peek().map(|e| e.name.as_str()), Some("big"));

    // Retried once the region can pay for it.
    let factory = world.free_factory("W1").unwrap();
    world.set_store(factory, 1000);

    let report = drain.run(&mut region, &mut world);
    assert_eq!(report.spawned, vec!["big"]);
    assert_eq!(region.spawn_queue.peek().map(|e| e.name.as_str()), Some("small"));
}

#[test]
fn test_name_clash_renames_head() {
    let mut world = world_with_factories(1, 1000);
    world.add_unit("dup", "W1", Position::new(1, 1), Body::from_parts(&[BodyPart::Move]));

    let mut region = RegionMemory::default();
    region.spawn_queue.push(entry("dup", 1));

    let mut drain = Drain::new();
    let report = drain.run(&mut region, &mut world);
    assert!(report.spawned.is_empty());
    assert_eq!(region.spawn_queue.peek().map(|e| e.name.as_str()), Some("worker-0-0"));

    let report = drain.run(&mut region, &mut world);
    assert_eq!(report.spawned, vec!["worker-0-0"]);
    assert!(region.spawn_queue.is_empty());
}

#[test]
fn test_invalid_body_is_dropped() {
    let mut world = world_with_factories(1, 1000);
    let mut region = RegionMemory::default();
    region.spawn_queue.push(SpawnQueueEntry::new(
        Body::new(), "broken".to_string(), Role::Worker, UnitMemory::new(Role::Worker, "W1", None)));
    region.spawn_queue.push(entry("a", 1));

    let mut drain = Drain::new();
    let report = drain.run(&mut region, &mut world);

    assert_eq!(report.spawned, vec!["a"]);
    assert_eq!(report.errors, vec![FleetError::InvalidBody {
        region: "W1".to_string(),
        name: "broken".to_string(),
    }]);
    assert!(region.spawn_queue.is_empty());
}

#[test]
fn test_deposit_priority_classes() {
    let mut world = SimWorld::new(WorldConstants::default());
    world.add_region("W1", 8);
    let from = Position::new(10, 10);

    let storage   = world.add_structure("W1", StructureKind::Storage,   Position::new(11, 10), 1000);
    let tower     = world.add_structure("W1", StructureKind::Tower,     Position::new(12, 10), 1000);
    let far_ext   = world.add_structure("W1", StructureKind::Extension, Position::new(30, 30), 50);
    let near_ext  = world.add_structure("W1", StructureKind::Extension, Position::new(15, 15), 50);
    let factory   = world.add_structure("W1", StructureKind::Factory,   Position::new(20, 10), 300);

    // Nearest of the first class, even though storage and tower are closer.
    assert_eq!(find_storage_with_space(&world, "W1", from), Some(near_ext));

    world.set_store(near_ext, 50);
    assert_eq!(find_storage_with_space(&world, "W1", from), Some(factory));

    world.set_store(factory, 300);
    world.set_store(far_ext, 50);
    assert_eq!(find_storage_with_space(&world, "W1", from), Some(tower));

    world.set_store(tower, 1000);
    assert_eq!(find_storage_with_space(&world, "W1", from), Some(storage));

    world.set_store(storage, 1000);
    assert_eq!(find_storage_with_space(&world, "W1", from), None);

    // Other regions are never considered.
    assert_eq!(find_storage_with_space(&world, "W2", from), None);
}
