use common::log;

use crate::{
    error::{FleetError, FleetResult},
    region,
    telemetry::DepositRecord,
    world::{ActionResult, Position, World, WorldSnapshot},
};

use super::{UnitBehavior, UnitContext, WorkerTask};

// Snapshot of the fields the task machine reads from the world.
struct UnitState {
    pos: Position,
    store_used: u32,
    free_capacity: u32,
    config_ratio: f64,
    spawning: bool,
}

fn unit_state<W: WorldSnapshot>(world: &W, name: &str) -> Option<UnitState> {
    world.unit(name).map(|unit| UnitState {
        pos: unit.pos,
        store_used: unit.store_used,
        free_capacity: unit.free_capacity(),
        config_ratio: unit.body.config_ratio(),
        spawning: unit.spawning,
    })
}

// ----------------------------------------------
// WorkerUnit
// ----------------------------------------------

// Harvests its assigned node, carries the load to the nearest storage with
// space and reports each round trip to the node's telemetry.
pub struct WorkerUnit;

impl UnitBehavior for WorkerUnit {
    fn tick<W: World>(&mut self, context: &mut UnitContext<'_, W>) -> FleetResult<()> {
        let Some(state) = unit_state(&*context.world, context.name) else {
            return Ok(());
        };

        if state.spawning {
            return Ok(());
        }

        if self.should_update_task(context) {
            match context.memory.task {
                None => context.memory.task = Some(WorkerTask::Harvesting),
                Some(WorkerTask::Harvesting) => begin_depositing(context, state.store_used),
                Some(WorkerTask::Depositing) => {}
            }
        }

        let mut result = Ok(());

        // Fullness and emptiness are judged on the state at the start of the tick.
        // A harvest phase that ends hands over to the deposit phase within the same tick.
        if context.memory.task == Some(WorkerTask::Harvesting) {
            let harvested = harvest(context, &state);
            if !matches!(harvested, Ok(ActionResult::Ok)) {
                begin_depositing(context, state.store_used);
            }

            if let Err(err) = harvested {
                log::warn!(log::channel!("worker"), "{err}");
                result = Err(err);
            }
        }

        if context.memory.task == Some(WorkerTask::Depositing) {
            let deposited = deposit(context, &state);
            if !deposited.is_ok() || state.store_used == 0 {
                finish_round_trip(context, state.config_ratio);
            }
        }

        result
    }

    fn should_update_task<W: WorldSnapshot>(&self, context: &UnitContext<'_, W>) -> bool {
        match context.memory.task {
            None => true,
            Some(WorkerTask::Harvesting) => {
                unit_state(&*context.world, context.name).is_some_and(|s| s.free_capacity == 0)
            },
            Some(WorkerTask::Depositing) => false,
        }
    }
}

// ----------------------------------------------
// Internal helpers
// ----------------------------------------------

fn begin_depositing<W: World>(context: &mut UnitContext<'_, W>, carried: u32) {
    log::verbose!(log::channel!("worker"), "'{}' switching to deposit mode carrying {carried}.", context.name);

    let now = context.world.tick();
    let memory = &mut *context.memory;
    memory.task = Some(WorkerTask::Depositing);
    memory.deposit_start = now;
    memory.deposit_amount = carried;
}

fn finish_round_trip<W: World>(context: &mut UnitContext<'_, W>, config_ratio: f64) {
    log::verbose!(log::channel!("worker"), "'{}' switching to harvest mode.", context.name);
    context.memory.task = Some(WorkerTask::Harvesting);

    let Some(node) = context.memory.assigned_node else {
        return;
    };

    // Zero elapsed time means storage was already full when the trip began.
    let elapsed = context.world.tick().saturating_sub(context.memory.deposit_start);
    if elapsed == 0 {
        return;
    }

    let record = DepositRecord {
        elapsed,
        amount: context.memory.deposit_amount,
        config_ratio,
    };

    log::verbose!(log::channel!("worker"),
                  "'{}' completed a round trip for {node}: {} ticks, {} carried.",
                  context.name, record.elapsed, record.amount);

    context.telemetry.record(node, record);
    context.allocator.unassign(context.name, context.memory);
}

// Any result other than `Ok` ends the harvest phase. Walking to the node counts as `Ok`.
fn harvest<W: World>(context: &mut UnitContext<'_, W>, state: &UnitState) -> FleetResult<ActionResult> {
    let Some(node_id) = context.memory.assigned_node else {
        return Ok(ActionResult::InvalidTarget);
    };

    let Some(node_pos) = context.world.node(node_id).map(|node| node.pos) else {
        context.allocator.unassign(context.name, context.memory);
        return Err(FleetError::InvalidAssignment {
            unit: context.name.to_string(),
            node: node_id,
        });
    };

    if state.free_capacity == 0 {
        return Ok(ActionResult::Full);
    }

    let result = context.world.harvest(context.name, node_id);
    if result == ActionResult::NotInRange {
        context.world.move_to(context.name, node_pos);
        return Ok(ActionResult::Ok);
    }

    Ok(result)
}

// Any result other than `Ok` ends the deposit phase. Walking to the target counts as `Ok`.
fn deposit<W: World>(context: &mut UnitContext<'_, W>, state: &UnitState) -> ActionResult {
    if state.store_used == 0 {
        return ActionResult::NotEnoughResources;
    }

    let Some(target) = region::find_storage_with_space(&*context.world, &context.memory.home, state.pos) else {
        return ActionResult::Full;
    };

    let result = context.world.transfer(context.name, target);
    if result == ActionResult::NotInRange {
        if let Some(target_pos) = context.world.structure(target).map(|s| s.pos) {
            context.world.move_to(context.name, target_pos);
        }
        return ActionResult::Ok;
    }

    result
}
