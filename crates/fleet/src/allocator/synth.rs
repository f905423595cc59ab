use common::log;

use crate::{
    config::{AllocatorConfigs, WorldConstants},
    telemetry::Sample,
    world::{Body, BodyPart},
};

use super::curve;

// Nearest power of two. Ties round up.
pub fn round_to_power_of_two(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }

    let lower = 2.0_f64.powi(value.log2().floor() as i32);
    let upper = lower * 2.0;

    if value - lower < upper - value { lower } else { upper }
}

// Deposit time a new unit is sized for.
#[inline]
pub fn target_deposit_time(constants: &WorldConstants, configs: &AllocatorConfigs) -> f64 {
    let target_ratio = {
        if configs.target_harvest_deposit_ratio > 0.0 {
            configs.target_harvest_deposit_ratio
        } else {
            1.0
        }
    };
    constants.harvest_time() / target_ratio
}

// Move segments per harvest segment for the next unit of a node.
pub fn target_config_ratio(samples: &[Sample], constants: &WorldConstants, configs: &AllocatorConfigs) -> f64 {
    let target_time = target_deposit_time(constants, configs);
    let ratio = curve::config_ratio_for(samples, target_time, configs.default_config_ratio);

    // Bounds come straight from the config file and may be inverted; the upper one wins.
    round_to_power_of_two(ratio)
        .max(configs.min_config_ratio)
        .min(configs.max_config_ratio)
}

// ----------------------------------------------
// synthesize_body
// ----------------------------------------------

// Largest body that does not exceed the extraction need (`max_capacity` per tick),
// the unit size cap and `budget`. Pairs of [harvest, carry] followed by moves.
// An empty body means no unit can serve the need this cycle.
pub fn synthesize_body(constants: &WorldConstants,
                       configs: &AllocatorConfigs,
                       samples: &[Sample],
                       max_capacity: f64,
                       budget: u32) -> Body {
    if max_capacity.is_nan() || max_capacity <= 0.0 {
        return Body::new();
    }

    let harvest_time = constants.harvest_time();
    let deposit_time = target_deposit_time(constants, configs);
    let ratio = target_config_ratio(samples, constants, configs);

    let segment_extraction = constants.carry_capacity as f64 / (harvest_time + deposit_time);
    let needed_pairs = (max_capacity / segment_extraction).ceil() * 2.0;

    let size_limit_pairs = (constants.max_unit_size as f64 / (ratio + 2.0)).floor();

    let pair_cost = constants.segment_cost(BodyPart::Harvest) as f64
                  + constants.segment_cost(BodyPart::Carry) as f64
                  + constants.segment_cost(BodyPart::Move) as f64 * ratio;
    let cost_limit_pairs = (budget as f64 / pair_cost).floor();

    let mut pairs = needed_pairs.min(size_limit_pairs).min(cost_limit_pairs).max(0.0) as u32;
    let mut moves = move_segments(pairs, ratio);

    // Rounding moves up can push a body just past either cap.
    while pairs > 0 && !fits(constants, pairs, moves, budget) {
        pairs -= 1;
        moves = move_segments(pairs, ratio);
    }

    if pairs == 0 {
        log::verbose!(log::channel!("allocator"),
                      "No body can serve {max_capacity:.2}/tick with budget {budget} (ratio {ratio}).");
        return Body::new();
    }

    let mut body = Body::new();
    for _ in 0..pairs {
        body.push(BodyPart::Harvest);
        body.push(BodyPart::Carry);
    }
    for _ in 0..moves {
        body.push(BodyPart::Move);
    }

    debug_assert!(body.len() as u32 <= constants.max_unit_size);
    debug_assert!(body.cost(constants) <= budget);
    body
}

#[inline]
fn move_segments(pairs: u32, ratio: f64) -> u32 {
    (pairs as f64 * ratio).ceil() as u32
}

#[inline]
fn fits(constants: &WorldConstants, pairs: u32, moves: u32, budget: u32) -> bool {
    let size = pairs * 2 + moves;
    let cost = pairs * (constants.segment_cost(BodyPart::Harvest) + constants.segment_cost(BodyPart::Carry))
             + moves * constants.segment_cost(BodyPart::Move);
    size <= constants.max_unit_size && cost <= budget
}
