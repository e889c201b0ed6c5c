//! Simulation harness
//!
//! Drives a [`System`] forward with noise drawn from its own distributions,
//! producing ground-truth trajectories and measurements for estimators.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SimConfig;
use crate::error::Result;
use crate::system::System;

/// One time step of a simulated trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct SimStep {
    pub k: usize,
    pub state: DVector<f64>,
    pub output: DVector<f64>,
}

/// Run a simulation from a sampled initial state
pub fn simulate(system: &System, config: &SimConfig) -> Result<Vec<SimStep>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let x0 = system.sample_initial_state(&mut rng)?;
    simulate_from(system, x0, config.steps, &mut rng)
}

/// Run a simulation from a given initial state
pub fn simulate_from(
    system: &System,
    x0: DVector<f64>,
    steps: usize,
    rng: &mut StdRng,
) -> Result<Vec<SimStep>> {
    let mut results = Vec::with_capacity(steps);
    let mut state = x0;

    for k in 0..steps {
        let v = system.sample_observation_noise(rng)?;
        let output = system.evaluate_observation(&state, &v)?;

        let w = system.sample_process_noise(rng)?;
        let next = system.evaluate_dynamics(&state, &w)?;

        log::trace!("step {k}: x = {:?}, y = {:?}", state.as_slice(), output.as_slice());

        results.push(SimStep { k, state, output });
        state = next;
    }

    Ok(results)
}

/// Extract component `index` of the state along a trajectory
pub fn state_column(steps: &[SimStep], index: usize) -> Vec<f64> {
    steps.iter().map(|s| s.state[index]).collect()
}

/// RMS of `output[output_index] - state[state_index]` along a trajectory
pub fn output_residual_rms(steps: &[SimStep], state_index: usize, output_index: usize) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = steps
        .iter()
        .map(|s| s.output[output_index] - s.state[state_index])
        .map(|r| r * r)
        .sum();
    (sum_sq / steps.len() as f64).sqrt()
}
