// Control loop for a fleet of worker units harvesting regenerating resource
// nodes. `FleetController::tick` is the per-tick entry point.

pub mod allocator;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod memory;
pub mod region;
pub mod save;
pub mod sim;
pub mod telemetry;
pub mod unit;
pub mod world;

pub use config::FleetConfigs;
pub use controller::{FleetController, TickReport};
pub use error::{FleetError, FleetResult};
pub use memory::FleetMemory;
