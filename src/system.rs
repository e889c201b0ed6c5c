//! Stochastic dynamical system with additive noise
//!
//! x[k+1] = f(x[k]) + w[k]
//! y[k]   = g(x[k]) + v[k]
//!
//! `f` and `g` are noise-free maps; `w` and `v` are supplied by the caller,
//! typically drawn from the system's own noise distributions.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use rand::RngCore;

use crate::distribution::Sampler;
use crate::error::{Result, SystemError};
use crate::map::VectorMap;

/// Discrete-time stochastic system
///
/// Immutable once built. Cloning shares the maps and distributions.
#[derive(Clone)]
pub struct System {
    state_dim: usize,
    output_dim: usize,
    transition_map: Arc<dyn VectorMap>,
    observation_map: Arc<dyn VectorMap>,
    initial_state_dist: Arc<dyn Sampler>,
    process_noise_dist: Arc<dyn Sampler>,
    observation_noise_dist: Arc<dyn Sampler>,
}

impl System {
    /// Create a system from noise-free maps and its three distributions.
    ///
    /// Nothing is validated here; a dimension mismatch surfaces when the
    /// system is evaluated or sampled.
    pub fn new<F, G>(
        state_dim: usize,
        output_dim: usize,
        transition_map: F,
        observation_map: G,
        initial_state_dist: Arc<dyn Sampler>,
        process_noise_dist: Arc<dyn Sampler>,
        observation_noise_dist: Arc<dyn Sampler>,
    ) -> Self
    where
        F: VectorMap + 'static,
        G: VectorMap + 'static,
    {
        Self {
            state_dim,
            output_dim,
            transition_map: Arc::new(transition_map),
            observation_map: Arc::new(observation_map),
            initial_state_dist,
            process_noise_dist,
            observation_noise_dist,
        }
    }

    /// Next state: `f(state) + process_noise`
    pub fn evaluate_dynamics(
        &self,
        state: &DVector<f64>,
        process_noise: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        let mean = self.transition_map.apply(state)?;
        broadcast_add("dynamics", mean, process_noise)
    }

    /// Measurement: `g(state) + observation_noise`
    pub fn evaluate_observation(
        &self,
        state: &DVector<f64>,
        observation_noise: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        let mean = self.observation_map.apply(state)?;
        broadcast_add("observation", mean, observation_noise)
    }

    /// Draw `count` initial states as the rows of a `count x state_dim` matrix.
    ///
    /// The raw draws are flattened in order and reshaped without padding,
    /// so the initial-state distribution must yield exactly
    /// `count * state_dim` scalars. A scalar distribution only satisfies
    /// this when `state_dim == 1`.
    pub fn sample_initial_states(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<DMatrix<f64>> {
        let draws = self.initial_state_dist.sample_n(count, rng)?;
        let flat: Vec<f64> = draws.iter().flat_map(|d| d.iter().copied()).collect();

        if flat.len() != count * self.state_dim {
            return Err(SystemError::Reshape {
                rows: count,
                cols: self.state_dim,
                got: flat.len(),
            });
        }

        Ok(DMatrix::from_row_slice(count, self.state_dim, &flat))
    }

    /// Draw one initial state
    pub fn sample_initial_state(&self, rng: &mut dyn RngCore) -> Result<DVector<f64>> {
        Ok(self.sample_initial_states(1, rng)?.row(0).transpose())
    }

    /// Draw one process-noise vector
    pub fn sample_process_noise(&self, rng: &mut dyn RngCore) -> Result<DVector<f64>> {
        self.process_noise_dist.draw(rng)
    }

    /// Draw one observation-noise vector
    pub fn sample_observation_noise(&self, rng: &mut dyn RngCore) -> Result<DVector<f64>> {
        self.observation_noise_dist.draw(rng)
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn transition_map(&self) -> &dyn VectorMap {
        self.transition_map.as_ref()
    }

    pub fn observation_map(&self) -> &dyn VectorMap {
        self.observation_map.as_ref()
    }

    pub fn initial_state_dist(&self) -> &dyn Sampler {
        self.initial_state_dist.as_ref()
    }

    pub fn process_noise_dist(&self) -> &dyn Sampler {
        self.process_noise_dist.as_ref()
    }

    pub fn observation_noise_dist(&self) -> &dyn Sampler {
        self.observation_noise_dist.as_ref()
    }
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("state_dim", &self.state_dim)
            .field("output_dim", &self.output_dim)
            .finish_non_exhaustive()
    }
}

/// Element-wise sum; a length-1 operand is broadcast against the other.
fn broadcast_add(
    context: &'static str,
    mean: DVector<f64>,
    noise: &DVector<f64>,
) -> Result<DVector<f64>> {
    match (mean.len(), noise.len()) {
        (a, b) if a == b => Ok(mean + noise),
        (1, _) => Ok(noise.add_scalar(mean[0])),
        (_, 1) => Ok(mean.add_scalar(noise[0])),
        (expected, got) => Err(SystemError::ShapeMismatch {
            context,
            expected,
            got,
        }),
    }
}
