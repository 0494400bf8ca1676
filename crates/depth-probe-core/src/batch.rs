// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Batch driver: one gap search per log-spaced sample distance.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ConfigError, ProbeConfig};
use crate::oracle::{DepthOracle, OracleError};
use crate::samples::sample_distances;
use crate::search::search_gap;
use crate::trial::TrialEvaluator;

/// Converged gap at one sample distance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Distance from the viewer the planes were centred on.
    pub sample_distance: f32,
    /// Smallest reliably resolved gap, or `far` when `out_of_range`.
    pub resolved_gap: f32,
    /// The distance fell outside the frustum and `resolved_gap` is a sentinel.
    #[serde(default)]
    pub out_of_range: bool,
}

/// Drives the whole run against a single oracle. Probes are strictly
/// sequential because the oracle owns mutable render state.
pub struct BatchDriver<O, R = StdRng> {
    config: ProbeConfig,
    evaluator: TrialEvaluator<O, R>,
}

impl<O: DepthOracle> BatchDriver<O, StdRng> {
    /// Build a driver whose jitter stream is derived from `seed`.
    pub fn new(config: ProbeConfig, oracle: O, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, oracle, StdRng::seed_from_u64(seed))
    }
}

impl<O, R> BatchDriver<O, R>
where
    O: DepthOracle,
    R: Rng,
{
    /// Build a driver with an explicit jitter source.
    pub fn with_rng(config: ProbeConfig, oracle: O, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        if oracle.encoding() != config.encoding {
            return Err(ConfigError::EncodingMismatch {
                config: config.encoding,
                oracle: oracle.encoding(),
            });
        }
        let evaluator = TrialEvaluator::new(
            oracle,
            rng,
            config.depth_params(),
            config.num_perturbed_trials,
        );
        Ok(Self { config, evaluator })
    }

    /// Configuration of this run.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Release the oracle once the run is over.
    pub fn into_oracle(self) -> O {
        self.evaluator.into_oracle()
    }

    /// Probe every sample distance and collect the results in distance order.
    pub fn run(&mut self) -> Result<Vec<ProbeResult>, OracleError> {
        self.run_with(|_, _| {})
    }

    /// Like [`BatchDriver::run`], calling `on_probe(index, result)` as each
    /// probe completes.
    pub fn run_with<F>(&mut self, mut on_probe: F) -> Result<Vec<ProbeResult>, OracleError>
    where
        F: FnMut(usize, &ProbeResult),
    {
        let ProbeConfig {
            encoding,
            near,
            far,
            param_c,
            num_sample_points,
            num_perturbed_trials,
        } = self.config;
        info!(
            %encoding,
            description = encoding.describe(),
            near,
            far,
            param_c,
            num_sample_points,
            num_perturbed_trials,
            "starting depth precision probe"
        );

        let distances = sample_distances(near, far, num_sample_points);
        let mut results = Vec::with_capacity(distances.len());
        for (index, sample_distance) in distances.into_iter().enumerate() {
            let outcome = search_gap(&mut self.evaluator, sample_distance, near, far)?;
            let result = ProbeResult {
                sample_distance,
                resolved_gap: outcome.resolved_gap(far),
                out_of_range: outcome.is_out_of_range(),
            };
            debug!(
                index,
                sample_distance,
                resolved_gap = result.resolved_gap,
                out_of_range = result.out_of_range,
                "probe complete"
            );
            on_probe(index, &result);
            results.push(result);
        }
        Ok(results)
    }
}
