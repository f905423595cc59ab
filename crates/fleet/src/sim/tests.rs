use super::*;

fn worker_body(pairs: usize, moves: usize) -> Body {
    let mut body = Body::new();
    for _ in 0..pairs {
        body.push(BodyPart::Harvest);
        body.push(BodyPart::Carry);
    }
    for _ in 0..moves {
        body.push(BodyPart::Move);
    }
    body
}

#[test]
fn test_spawn_progress_and_energy() {
    let mut world = SimWorld::new(WorldConstants::default());
    world.add_region("W1", 2);
    let factory = world.add_structure("W1", StructureKind::Factory, Position::new(25, 25), 300);
    let extension = world.add_structure("W1", StructureKind::Extension, Position::new(26, 25), 50);
    world.set_store(factory, 300);
    world.set_store(extension, 50);

    let region = world.region("W1").unwrap();
    assert_eq!(region.energy_available, 350);
    assert_eq!(region.energy_capacity, 350);

    let body = worker_body(1, 1); // cost 200, 3 segments
    assert_eq!(world.free_factory("W1"), Some(factory));
    assert_eq!(world.spawn(factory, &body, "worker-0-0"), SpawnResult::Ok);
    assert_eq!(world.region("W1").unwrap().energy_available, 150);

    // Factory is busy and the unit exists but is not ready yet.
    assert_eq!(world.free_factory("W1"), None);
    assert_eq!(world.spawn(factory, &body, "worker-0-1"), SpawnResult::Busy);
    assert!(world.unit("worker-0-0").unwrap().spawning);

    for _ in 0..(3 * SPAWN_TICKS_PER_SEGMENT) {
        world.advance();
    }

    assert!(!world.unit("worker-0-0").unwrap().spawning);
    assert_eq!(world.free_factory("W1"), Some(factory));
}

#[test]
fn test_spawn_failures() {
    let mut world = SimWorld::new(WorldConstants::default());
    world.add_region("W1", 1);
    let factory = world.add_structure("W1", StructureKind::Factory, Position::new(25, 25), 300);
    world.set_store(factory, 100);

    assert_eq!(world.spawn(factory, &Body::new(), "a"), SpawnResult::InvalidBody);
    assert_eq!(world.spawn(factory, &worker_body(1, 1), "a"), SpawnResult::InsufficientResources);

    world.add_unit("taken", "W1", Position::new(1, 1), worker_body(1, 1));
    assert_eq!(world.spawn(factory, &worker_body(1, 1), "taken"), SpawnResult::NameExists);
}

#[test]
fn test_harvest_and_transfer() {
    let mut world = SimWorld::new(WorldConstants::default());
    world.add_region("W1", 1);
    let node = world.add_node("W1", Position::new(10, 10), 3000);
    let factory = world.add_structure("W1", StructureKind::Factory, Position::new(12, 10), 300);

    world.add_unit("u", "W1", Position::new(13, 10), worker_body(2, 2));

    // Too far:
    assert_eq!(world.harvest("u", node), ActionResult::NotInRange);
    assert_eq!(world.move_to("u", Position::new(10, 10)), ActionResult::Ok);
    assert_eq!(world.unit("u").unwrap().pos, Position::new(12, 10));

    // Empty carry segments produce fatigue only for the harvest segments, which
    // two move segments recover in one tick.
    world.advance();
    assert_eq!(world.move_to("u", Position::new(10, 10)), ActionResult::Ok);
    world.advance();

    assert_eq!(world.harvest("u", node), ActionResult::Ok);
    assert_eq!(world.unit("u").unwrap().store_used, 4);
    assert_eq!(world.node(node).unwrap().amount, 2996);

    // The factory also refilled a little on its own while the unit walked.
    let before = world.structure(factory).unwrap().store_used;
    assert_eq!(world.transfer("u", factory), ActionResult::Ok);
    assert_eq!(world.unit("u").unwrap().store_used, 0);
    assert_eq!(world.structure(factory).unwrap().store_used, before + 4);
    assert_eq!(world.transfer("u", factory), ActionResult::NotEnoughResources);
}

#[test]
fn test_fatigue_slows_loaded_units() {
    let mut world = SimWorld::new(WorldConstants::default());
    world.add_region("W1", 1);
    world.add_unit("u", "W1", Position::new(0, 0), worker_body(2, 1));
    world.set_unit_store("u", 100);

    assert_eq!(world.move_to("u", Position::new(10, 0)), ActionResult::Ok);
    // 2 harvest + 2 loaded carry segments: 8 fatigue, 2 recovered per tick.
    world.advance();
    assert_eq!(world.move_to("u", Position::new(10, 0)), ActionResult::Tired);
    for _ in 0..3 {
        world.advance();
    }
    assert_eq!(world.move_to("u", Position::new(10, 0)), ActionResult::Ok);
    assert_eq!(world.unit("u").unwrap().pos, Position::new(2, 0));
}

#[test]
fn test_node_regeneration() {
    let constants = WorldConstants { regen_cycle_ticks: 10, ..WorldConstants::default() };
    let mut world = SimWorld::new(constants);
    world.add_region("W1", 1);
    let node = world.add_node("W1", Position::new(5, 5), 20);
    world.add_unit("u", "W1", Position::new(5, 6), worker_body(5, 1));

    assert_eq!(world.harvest("u", node), ActionResult::Ok);
    assert_eq!(world.harvest("u", node), ActionResult::Ok);
    assert_eq!(world.node(node).unwrap().amount, 0);
    assert_eq!(world.harvest("u", node), ActionResult::NotEnoughResources);

    for _ in 0..10 {
        world.advance();
    }
    assert_eq!(world.node(node).unwrap().amount, 20);
}

#[test]
fn test_generate_is_deterministic() {
    let a = SimWorld::generate(WorldConstants::default(), 42, 3);
    let b = SimWorld::generate(WorldConstants::default(), 42, 3);

    let nodes_a: Vec<(NodeId, Position)> = a.nodes.values().map(|n| (n.id, n.pos)).collect();
    let nodes_b: Vec<(NodeId, Position)> = b.nodes.values().map(|n| (n.id, n.pos)).collect();
    assert_eq!(nodes_a, nodes_b);
    assert_eq!(a.regions().count(), 3);

    for region in a.regions() {
        assert!(a.free_factory(&region.name).is_some());
        assert!(region.energy_available >= FACTORY_STORE_CAPACITY);
    }
}
