use thiserror::Error;

use crate::world::{NodeId, RegionName, UnitName};

// ----------------------------------------------
// FleetError
// ----------------------------------------------

// Faults the engine can detect during a tick. All of them are handled where they
// are found (logged, state repaired) and collected into the tick report; none of
// them aborts processing of other regions or units.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FleetError {
    #[error("unit '{unit}' is assigned to node {node} which no longer exists in its region")]
    InvalidAssignment {
        unit: UnitName,
        node: NodeId,
    },

    #[error("region '{region}' cannot afford spawning '{name}' (cost {cost})")]
    InsufficientResources {
        region: RegionName,
        name: UnitName,
        cost: u32,
    },

    #[error("region '{region}' has no allocation configuration")]
    ConfigurationMissing {
        region: RegionName,
    },

    #[error("unit '{unit}' has unrecognized role tag '{role}'")]
    UnknownRole {
        unit: UnitName,
        role: String,
    },

    #[error("factory rejected the body of '{name}' in region '{region}'")]
    InvalidBody {
        region: RegionName,
        name: UnitName,
    },

    #[error("save/load failed: {0}")]
    Save(String),
}

pub type FleetResult<T> = Result<T, FleetError>;
