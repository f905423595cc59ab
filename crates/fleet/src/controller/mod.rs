use common::log;

use crate::{
    allocator::Allocator,
    config::FleetConfigs,
    error::FleetError,
    memory::FleetMemory,
    unit::{UnitArchetype, UnitBehavior, UnitContext},
    world::{Tick, UnitName, World, WorldSnapshot},
};

// ----------------------------------------------
// TickReport
// ----------------------------------------------

#[derive(Default)]
pub struct TickReport {
    pub tick: Tick,

    // Units handed to a factory this tick.
    pub spawned: Vec<UnitName>,

    // Units whose memory was freed because they left the world.
    pub freed: Vec<UnitName>,

    // Faults found and handled this tick. None of them stopped the tick.
    pub errors: Vec<FleetError>,
}

impl TickReport {
    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ----------------------------------------------
// FleetController
// ----------------------------------------------

// Runs one tick of the whole fleet: stale state cleanup, allocation, spawn
// queues, then every unit. Allocation runs before the units so they act on
// this tick's assignments.
pub struct FleetController<'config> {
    configs: &'config FleetConfigs,
    allocator: Allocator,
    memory: FleetMemory,
}

impl<'config> FleetController<'config> {
    pub fn new(configs: &'config FleetConfigs, memory: FleetMemory) -> Self {
        Self {
            configs,
            allocator: Allocator::new(),
            memory,
        }
    }

    #[inline]
    pub fn memory(&self) -> &FleetMemory {
        &self.memory
    }

    #[inline]
    pub fn into_memory(self) -> FleetMemory {
        self.memory
    }

    pub fn tick<W>(&mut self, world: &mut W) -> TickReport
        where W: World
    {
        let mut report = TickReport { tick: world.tick(), ..Default::default() };

        self.cleanup(&*world, &mut report);

        report.errors.extend(self.allocator.tick(&*world, self.configs, &mut self.memory));

        self.tick_regions(world, &mut report);
        self.tick_units(world, &mut report);

        if report.has_errors() {
            log::verbose!(log::channel!("controller"),
                          "Tick {} finished with {} handled errors.", report.tick, report.errors.len());
        }

        report
    }

    fn cleanup<W>(&mut self, world: &W, report: &mut TickReport)
        where W: WorldSnapshot
    {
        report.freed = self.memory.remove_stale_units(world);
        report.errors.extend(self.memory.clear_invalid_assignments(world));
        self.memory.remove_stale_telemetry(world);
    }

    fn tick_regions<W>(&mut self, world: &mut W, report: &mut TickReport)
        where W: World
    {
        // Make sure every owned region has a queue to drain.
        let owned: Vec<String> = world.regions()
            .filter(|region| region.owned)
            .map(|region| region.name.clone())
            .collect();

        for name in owned {
            self.memory.regions.entry(name).or_default();
        }

        let FleetMemory { regions, units, names, .. } = &mut self.memory;

        for (name, region) in regions.iter_mut() {
            if world.region(name).is_none() {
                continue;
            }

            let region_report = region.tick(world, name, &self.configs.world, units, names);
            report.spawned.extend(region_report.spawned);
            report.errors.extend(region_report.errors);
        }
    }

    fn tick_units<W>(&mut self, world: &mut W, report: &mut TickReport)
        where W: World
    {
        let FleetMemory { units, telemetry, .. } = &mut self.memory;

        for (name, memory) in units.iter_mut() {
            let mut archetype = match UnitArchetype::from_role(name, &memory.role) {
                Ok(archetype) => archetype,
                Err(err) => {
                    log::error!(log::channel!("controller"), "{err}");
                    report.errors.push(err);
                    continue;
                }
            };

            let mut context = UnitContext {
                name,
                world: &mut *world,
                configs: self.configs,
                allocator: &self.allocator,
                telemetry: &mut *telemetry,
                memory,
            };

            if let Err(err) = archetype.tick(&mut context) {
                report.errors.push(err);
            }
        }
    }
}
