use smallvec::SmallVec;

use crate::{
    constants::DEPOSIT_HISTORY_LENGTH,
    telemetry::Sample,
};

// ----------------------------------------------
// CurveModel
// ----------------------------------------------

// Hyperbolic model of the config ratio a unit needs to reach a deposit time:
//   ratio = amplitude / time + offset
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveModel {
    pub amplitude: f64,
    pub offset: f64,
}

impl CurveModel {
    // Averages the two-point solutions of every adjacent sample pair, ordered by ratio.
    // Returns `None` with fewer than two samples, or when adjacent samples share a ratio.
    pub fn fit(samples: &[Sample]) -> Option<Self> {
        if samples.len() < 2 {
            return None;
        }

        let mut sorted: SmallVec<[Sample; DEPOSIT_HISTORY_LENGTH]> = SmallVec::from_slice(samples);
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut offset_sum = 0.0;
        let mut amplitude_sum = 0.0;

        for pair in sorted.windows(2) {
            let (time1, ratio1) = pair[0];
            let (time2, ratio2) = pair[1];

            if ratio1 == ratio2 {
                return None;
            }

            let offset = (ratio2 * time2 - ratio1 * time1) / (ratio2 - ratio1);
            let amplitude = time1 * (ratio1 - offset);

            offset_sum += offset;
            amplitude_sum += amplitude;
        }

        let pairs = (sorted.len() - 1) as f64;
        let model = Self {
            amplitude: amplitude_sum / pairs,
            offset: offset_sum / pairs,
        };

        if model.amplitude.is_finite() && model.offset.is_finite() {
            Some(model)
        } else {
            None
        }
    }

    #[inline]
    pub fn eval(&self, target_deposit_time: f64) -> f64 {
        self.amplitude / target_deposit_time + self.offset
    }
}

// Config ratio needed to reach `target_deposit_time`, or `default_ratio` when
// the samples cannot support a fit or the fit gives an unusable answer.
pub fn config_ratio_for(samples: &[Sample], target_deposit_time: f64, default_ratio: f64) -> f64 {
    CurveModel::fit(samples)
        .map(|model| model.eval(target_deposit_time))
        .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
        .unwrap_or(default_ratio)
}
