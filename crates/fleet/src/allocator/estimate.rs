use crate::{
    config::{FleetConfigs, WorldConstants},
    memory::FleetMemory,
    telemetry::TelemetryStore,
    world::{Body, BodyPart, ResourceNode, WorldSnapshot},
};

// Resource a unit with `body` moves per tick, counting both the time to fill
// its store and one deposit round trip.
pub fn extraction_rate(body: &Body, constants: &WorldConstants, average_deposit_time: f64) -> f64 {
    let capacity = body.store_capacity(constants) as f64;
    let harvest_rate = (body.count(BodyPart::Harvest) * constants.harvest_power) as f64;

    if capacity <= 0.0 || harvest_rate <= 0.0 {
        return 0.0;
    }

    let harvest_time = capacity / harvest_rate;
    capacity / (harvest_time + average_deposit_time)
}

// ----------------------------------------------
// NodeEstimator
// ----------------------------------------------

pub struct NodeEstimator<'a> {
    constants: &'a WorldConstants,
    regen_cycle_ticks: u32,
    deposit_time: Option<f64>,
    target_ratio: f64,
}

impl<'a> NodeEstimator<'a> {
    pub fn new(node: &ResourceNode, configs: &'a FleetConfigs, telemetry: &TelemetryStore) -> Self {
        let target_ratio = {
            if configs.allocator.target_harvest_deposit_ratio > 0.0 {
                configs.allocator.target_harvest_deposit_ratio
            } else {
                1.0
            }
        };
        Self {
            constants: &configs.world,
            regen_cycle_ticks: node.regen_cycle_ticks,
            deposit_time: telemetry.average_deposit_time(node.id),
            target_ratio,
        }
    }

    // Without telemetry a unit is assumed to deposit in its own harvest
    // time divided by the target harvest:deposit ratio.
    pub fn rate(&self, body: &Body) -> f64 {
        match self.deposit_time {
            Some(deposit_time) => extraction_rate(body, self.constants, deposit_time),
            None => {
                let capacity = body.store_capacity(self.constants) as f64;
                let harvest_rate = (body.count(BodyPart::Harvest) * self.constants.harvest_power) as f64;
                if capacity <= 0.0 || harvest_rate <= 0.0 {
                    return 0.0;
                }
                extraction_rate(body, self.constants, (capacity / harvest_rate) / self.target_ratio)
            }
        }
    }

    #[inline]
    pub fn per_cycle(&self, body: &Body) -> f64 {
        self.rate(body) * self.regen_cycle_ticks as f64
    }

    #[inline]
    pub fn has_telemetry(&self) -> bool {
        self.deposit_time.is_some()
    }
}

// Sum of the per-cycle extraction of every unit assigned to `node`, including
// queued units that will be assigned to it once materialized.
pub fn estimated_extraction_per_cycle<W>(world: &W,
                                         configs: &FleetConfigs,
                                         memory: &FleetMemory,
                                         node: &ResourceNode) -> f64
    where W: WorldSnapshot
{
    let estimator = NodeEstimator::new(node, configs, &memory.telemetry);

    let assigned: f64 = memory.assigned_units(node.id)
        .filter_map(|(name, _)| world.unit(name))
        .map(|unit| estimator.per_cycle(&unit.body))
        .sum();

    let pending: f64 = memory.spawn_queue(&node.region)
        .into_iter()
        .flat_map(|queue| queue.iter())
        .filter(|entry| entry.memory.assigned_node == Some(node.id))
        .map(|entry| estimator.per_cycle(&entry.body))
        .sum();

    assigned + pending
}
