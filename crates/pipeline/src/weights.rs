//! Blend weights and the feedback state machine.
//!
//! The CF weight moves in steps of 0.2 between 2.0 and 10.0 and the CBF
//! weight is always `12.0 - cf_weight`. Weights are stored as integer tenths
//! so the pair sums to exactly 12.0 no matter how many likes have been
//! applied.

use crate::feedback::{AttributionPolicy, FeedbackTracker};
use data_loader::{ModelKind, MovieId, RecsError, Result};
use serde::Serialize;
use tracing::debug;

/// Recommendations per hybrid response, split between the two models
pub const TOTAL_RECOMMENDATIONS: usize = 12;

const TOTAL_TENTHS: u32 = 120;
const MIN_CF_TENTHS: u32 = 20;
const MAX_CF_TENTHS: u32 = 100;
const STEP_TENTHS: u32 = 2;
const INITIAL_CF_TENTHS: u32 = 60;

/// The current CF/CBF blend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "WeightSnapshot")]
pub struct WeightState {
    cf_tenths: u32,
}

/// Serialized form of a `WeightState`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightSnapshot {
    pub cf_weight: f64,
    pub cbf_weight: f64,
}

impl From<WeightState> for WeightSnapshot {
    fn from(weights: WeightState) -> Self {
        Self {
            cf_weight: weights.cf_weight(),
            cbf_weight: weights.cbf_weight(),
        }
    }
}

impl WeightState {
    /// Even blend, 6.0 / 6.0
    pub fn new() -> Self {
        Self {
            cf_tenths: INITIAL_CF_TENTHS,
        }
    }

    /// Start from a specific CF weight
    ///
    /// The weight must lie in [2.0, 10.0] and be reachable in 0.2 steps.
    pub fn from_cf_weight(cf_weight: f64) -> Result<Self> {
        let tenths = (cf_weight * 10.0).round();
        let reachable = (cf_weight * 10.0 - tenths).abs() < 1e-6
            && tenths >= MIN_CF_TENTHS as f64
            && tenths <= MAX_CF_TENTHS as f64
            && (tenths as u32) % STEP_TENTHS == 0;
        if !reachable {
            return Err(RecsError::ValidationError(format!(
                "cf weight {} is not a multiple of 0.2 in [2.0, 10.0]",
                cf_weight
            )));
        }
        Ok(Self {
            cf_tenths: tenths as u32,
        })
    }

    pub fn cf_weight(&self) -> f64 {
        self.cf_tenths as f64 / 10.0
    }

    pub fn cbf_weight(&self) -> f64 {
        self.cbf_tenths() as f64 / 10.0
    }

    pub fn cf_tenths(&self) -> u32 {
        self.cf_tenths
    }

    pub fn cbf_tenths(&self) -> u32 {
        TOTAL_TENTHS - self.cf_tenths
    }

    /// Apply a like under the default attribution policy
    pub fn adjust(&mut self, liked: ModelKind, movie_id: MovieId, shown: &FeedbackTracker) -> bool {
        self.adjust_with_policy(liked, movie_id, shown, AttributionPolicy::default())
    }

    /// Apply a like: step toward the liked model when the movie can be
    /// credited to it and the weight is not already at its bound
    ///
    /// Returns whether the weights changed. Refusals are silent; a like at
    /// the bound or for a movie both models showed simply leaves the blend
    /// where it is.
    pub fn adjust_with_policy(
        &mut self,
        liked: ModelKind,
        movie_id: MovieId,
        shown: &FeedbackTracker,
        policy: AttributionPolicy,
    ) -> bool {
        if !policy.attributes(shown, liked, movie_id) {
            debug!("Like for movie {} not attributable to {}", movie_id, liked);
            return false;
        }

        match liked {
            ModelKind::Cf if self.cf_tenths < MAX_CF_TENTHS => {
                self.cf_tenths += STEP_TENTHS;
                true
            }
            ModelKind::Cbf if self.cf_tenths > MIN_CF_TENTHS => {
                self.cf_tenths -= STEP_TENTHS;
                true
            }
            _ => {
                debug!("{} weight already at its bound", liked);
                false
            }
        }
    }

    /// Integer neighbor counts for the two models, always summing to 12
    ///
    /// The model with the smaller weight is rounded up and the other
    /// truncated; when the CF weight is not the smaller one, CF is truncated
    /// and CBF rounded up.
    pub fn balanced_split(&self) -> (usize, usize) {
        let cf = self.cf_tenths;
        let cbf = self.cbf_tenths();
        let (cf_count, cbf_count) = if cf < cbf {
            (cf.div_ceil(10), cbf / 10)
        } else {
            (cf / 10, cbf.div_ceil(10))
        };
        (cf_count as usize, cbf_count as usize)
    }
}

impl Default for WeightState {
    fn default() -> Self {
        Self::new()
    }
}

/// All weight states reachable from the initial blend
pub fn reachable_states() -> impl Iterator<Item = WeightState> {
    (MIN_CF_TENTHS..=MAX_CF_TENTHS)
        .step_by(STEP_TENTHS as usize)
        .map(|cf_tenths| WeightState { cf_tenths })
}
