//! Additive-noise systems built from noise-parameterized maps
//!
//! A raw map `f(x, w)` is turned into a noise-free map by averaging it over
//! a fixed set of noise samples drawn once at build time:
//!
//! f_bar(x) = mean_i f(x, w_i),   w_i ~ process noise, i = 1..N
//!
//! The resulting [`System`] then re-injects noise additively.

use std::sync::Arc;

use nalgebra::DVector;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::AdditiveConfig;
use crate::distribution::Sampler;
use crate::error::{Result, SystemError};
use crate::map::{NoisyMap, VectorMap};
use crate::system::System;

/// How the per-sample outputs of a raw map are averaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanReduction {
    /// Mean over every scalar of every sample, broadcast to the map's output
    /// length. Vector outputs collapse to a single value. A raw map that
    /// returns empty vectors yields NaN.
    #[default]
    Scalar,
    /// Per-component mean; all samples must produce the same length.
    Elementwise,
}

/// Noise-free map obtained by averaging a raw map over captured noise samples
#[derive(Clone)]
pub struct MonteCarloMean {
    raw: Arc<dyn NoisyMap>,
    samples: Arc<[DVector<f64>]>,
    output_dim: usize,
    reduction: MeanReduction,
}

impl MonteCarloMean {
    pub fn new(
        raw: Arc<dyn NoisyMap>,
        samples: Vec<DVector<f64>>,
        output_dim: usize,
        reduction: MeanReduction,
    ) -> Self {
        Self {
            raw,
            samples: samples.into(),
            output_dim,
            reduction,
        }
    }

    pub fn samples(&self) -> &[DVector<f64>] {
        &self.samples
    }

    pub fn reduction(&self) -> MeanReduction {
        self.reduction
    }

    fn scalar_mean(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let mut total = 0.0;
        let mut count = 0usize;
        for w in self.samples.iter() {
            let y = self.raw.apply(x, w)?;
            total += y.sum();
            count += y.len();
        }
        Ok(DVector::from_element(self.output_dim, total / count as f64))
    }

    fn elementwise_mean(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let mut acc: Option<DVector<f64>> = None;
        for w in self.samples.iter() {
            let y = self.raw.apply(x, w)?;
            acc = Some(match acc {
                None => y,
                Some(sum) => {
                    if sum.len() != y.len() {
                        return Err(SystemError::ShapeMismatch {
                            context: "monte carlo sample",
                            expected: sum.len(),
                            got: y.len(),
                        });
                    }
                    sum + y
                }
            });
        }

        acc.map(|sum| sum / self.samples.len() as f64)
            .ok_or_else(|| SystemError::InvalidConfig("no noise samples captured".to_string()))
    }
}

impl VectorMap for MonteCarloMean {
    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        match self.reduction {
            MeanReduction::Scalar => self.scalar_mean(x),
            MeanReduction::Elementwise => self.elementwise_mean(x),
        }
    }
}

/// Builds a [`System`] whose maps are Monte Carlo means of raw noisy maps
#[derive(Clone)]
pub struct AdditiveSystemBuilder {
    state_dim: usize,
    output_dim: usize,
    raw_transition: Arc<dyn NoisyMap>,
    raw_observation: Arc<dyn NoisyMap>,
    initial_state_dist: Arc<dyn Sampler>,
    process_noise_dist: Arc<dyn Sampler>,
    observation_noise_dist: Arc<dyn Sampler>,
    sample_count: usize,
    reduction: MeanReduction,
}

impl AdditiveSystemBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new<F, G>(
        state_dim: usize,
        output_dim: usize,
        raw_transition: F,
        raw_observation: G,
        initial_state_dist: Arc<dyn Sampler>,
        process_noise_dist: Arc<dyn Sampler>,
        observation_noise_dist: Arc<dyn Sampler>,
        sample_count: usize,
    ) -> Self
    where
        F: NoisyMap + 'static,
        G: NoisyMap + 'static,
    {
        Self {
            state_dim,
            output_dim,
            raw_transition: Arc::new(raw_transition),
            raw_observation: Arc::new(raw_observation),
            initial_state_dist,
            process_noise_dist,
            observation_noise_dist,
            sample_count,
            reduction: MeanReduction::default(),
        }
    }

    /// Builder with dimensions, sample count and reduction taken from a validated config
    pub fn from_config<F, G>(
        config: &AdditiveConfig,
        raw_transition: F,
        raw_observation: G,
        initial_state_dist: Arc<dyn Sampler>,
        process_noise_dist: Arc<dyn Sampler>,
        observation_noise_dist: Arc<dyn Sampler>,
    ) -> Result<Self>
    where
        F: NoisyMap + 'static,
        G: NoisyMap + 'static,
    {
        config.validate()?;
        Ok(Self::new(
            config.state_dim,
            config.output_dim,
            raw_transition,
            raw_observation,
            initial_state_dist,
            process_noise_dist,
            observation_noise_dist,
            config.sample_count,
        )
        .with_reduction(config.reduction))
    }

    pub fn with_reduction(mut self, reduction: MeanReduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Draw the noise sample sets and assemble the system.
    ///
    /// Each call draws fresh samples; the maps of the returned system reuse
    /// their captured samples on every evaluation.
    pub fn build(&self, rng: &mut dyn RngCore) -> Result<System> {
        if self.sample_count == 0 {
            return Err(SystemError::InvalidConfig(
                "sample_count must be greater than zero".to_string(),
            ));
        }

        let process_samples = self.process_noise_dist.sample_n(self.sample_count, rng)?;
        let observation_samples = self
            .observation_noise_dist
            .sample_n(self.sample_count, rng)?;

        log::debug!(
            "Additive system: {} process / {} observation noise samples, {:?} mean",
            process_samples.len(),
            observation_samples.len(),
            self.reduction
        );

        let transition = MonteCarloMean::new(
            Arc::clone(&self.raw_transition),
            process_samples,
            self.state_dim,
            self.reduction,
        );
        let observation = MonteCarloMean::new(
            Arc::clone(&self.raw_observation),
            observation_samples,
            self.output_dim,
            self.reduction,
        );

        Ok(System::new(
            self.state_dim,
            self.output_dim,
            transition,
            observation,
            Arc::clone(&self.initial_state_dist),
            Arc::clone(&self.process_noise_dist),
            Arc::clone(&self.observation_noise_dist),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{Independent, PointMass, Univariate};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::Normal;

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(values)
    }

    fn shift(x: &DVector<f64>, w: &DVector<f64>) -> DVector<f64> {
        x.add_scalar(w[0])
    }

    struct FailingMap;

    impl NoisyMap for FailingMap {
        fn apply(&self, _x: &DVector<f64>, _noise: &DVector<f64>) -> Result<DVector<f64>> {
            Err(SystemError::Map("raw map failed".to_string()))
        }
    }

    struct Exhausted;

    impl Sampler for Exhausted {
        fn sample_n(&self, _n: usize, _rng: &mut dyn RngCore) -> Result<Vec<DVector<f64>>> {
            Err(SystemError::Sampling("sampler exhausted".to_string()))
        }
    }

    #[test]
    fn test_constant_noise_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let builder = AdditiveSystemBuilder::new(
            1,
            1,
            |x: &DVector<f64>, w: &DVector<f64>| x + w,
            |x: &DVector<f64>, w: &DVector<f64>| x + w,
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(PointMass::scalar(1.0)),
            Arc::new(PointMass::scalar(0.0)),
            3,
        );
        let system = builder.build(&mut rng).unwrap();

        let fx = system.transition_map().apply(&v(&[5.0])).unwrap();
        assert!((fx[0] - 6.0).abs() < 1e-10);
        let next = system.evaluate_dynamics(&v(&[5.0]), &v(&[0.0])).unwrap();
        assert!((next[0] - 6.0).abs() < 1e-10);
        let y = system.evaluate_observation(&v(&[5.0]), &v(&[0.0])).unwrap();
        assert!((y[0] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_derived_map_is_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let builder = AdditiveSystemBuilder::new(
            1,
            1,
            shift,
            shift,
            Arc::new(Univariate::normal(0.0, 1.0).unwrap()),
            Arc::new(Univariate::normal(0.0, 1.0).unwrap()),
            Arc::new(Univariate::normal(0.0, 1.0).unwrap()),
            50,
        );
        let system = builder.build(&mut rng).unwrap();

        let x = v(&[2.0]);
        let zero = v(&[0.0]);
        let first = system.evaluate_dynamics(&x, &zero).unwrap();
        for _ in 0..10 {
            assert_eq!(system.evaluate_dynamics(&x, &zero).unwrap(), first);
        }
    }

    #[test]
    fn test_zero_sample_count_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let builder = AdditiveSystemBuilder::new(
            1,
            1,
            shift,
            shift,
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(PointMass::scalar(0.0)),
            0,
        );
        assert!(matches!(
            builder.build(&mut rng),
            Err(SystemError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_scalar_mean_collapses_vector_output() {
        let raw: Arc<dyn NoisyMap> = Arc::new(|x: &DVector<f64>, w: &DVector<f64>| x + w);
        let samples = vec![v(&[1.0, 1.0]), v(&[3.0, 3.0])];
        let mean = MonteCarloMean::new(raw, samples, 2, MeanReduction::Scalar);

        let fx = mean.apply(&v(&[0.0, 10.0])).unwrap();
        // mean of [1, 11, 3, 13]
        assert_eq!(fx, v(&[7.0, 7.0]));
    }

    #[test]
    fn test_elementwise_mean_keeps_components() {
        let raw: Arc<dyn NoisyMap> = Arc::new(|x: &DVector<f64>, w: &DVector<f64>| x + w);
        let samples = vec![v(&[1.0, 1.0]), v(&[3.0, 3.0])];
        let mean = MonteCarloMean::new(raw, samples, 2, MeanReduction::Elementwise);

        let fx = mean.apply(&v(&[0.0, 10.0])).unwrap();
        assert_eq!(fx, v(&[2.0, 12.0]));
    }

    #[test]
    fn test_elementwise_mean_ragged_outputs() {
        let raw: Arc<dyn NoisyMap> = Arc::new(|_x: &DVector<f64>, w: &DVector<f64>| w.clone());
        let samples = vec![v(&[1.0, 1.0]), v(&[3.0])];
        let mean = MonteCarloMean::new(raw, samples, 2, MeanReduction::Elementwise);

        assert!(matches!(
            mean.apply(&v(&[0.0, 0.0])),
            Err(SystemError::ShapeMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_elementwise_builder_with_vector_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let builder = AdditiveSystemBuilder::new(
            2,
            1,
            |x: &DVector<f64>, w: &DVector<f64>| x + w,
            |x: &DVector<f64>, w: &DVector<f64>| DVector::from_element(1, x[0] + w[0]),
            Arc::new(Independent::iid(Normal::new(0.0, 1.0).unwrap(), 2)),
            Arc::new(PointMass::new(v(&[0.5, -0.5]))),
            Arc::new(PointMass::scalar(0.0)),
            4,
        )
        .with_reduction(MeanReduction::Elementwise);
        let system = builder.build(&mut rng).unwrap();

        let next = system
            .evaluate_dynamics(&v(&[1.0, 1.0]), &DVector::zeros(2))
            .unwrap();
        assert!((next[0] - 1.5).abs() < 1e-10);
        assert!((next[1] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_raw_map_error_propagates() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let builder = AdditiveSystemBuilder::new(
            1,
            1,
            FailingMap,
            shift,
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(PointMass::scalar(0.0)),
            2,
        );
        let system = builder.build(&mut rng).unwrap();
        assert!(matches!(
            system.evaluate_dynamics(&v(&[1.0]), &v(&[0.0])),
            Err(SystemError::Map(_))
        ));
    }

    #[test]
    fn test_raw_observation_error_propagates() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let builder = AdditiveSystemBuilder::new(
            1,
            1,
            shift,
            FailingMap,
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(PointMass::scalar(0.0)),
            2,
        );
        let system = builder.build(&mut rng).unwrap();
        assert!(system.evaluate_dynamics(&v(&[1.0]), &v(&[0.0])).is_ok());
        assert!(matches!(
            system.evaluate_observation(&v(&[1.0]), &v(&[0.0])),
            Err(SystemError::Map(_))
        ));
    }

    #[test]
    fn test_noise_sampler_error_fails_build() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let process_fails = AdditiveSystemBuilder::new(
            1,
            1,
            shift,
            shift,
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(Exhausted),
            Arc::new(PointMass::scalar(0.0)),
            3,
        );
        assert!(matches!(
            process_fails.build(&mut rng),
            Err(SystemError::Sampling(_))
        ));

        let observation_fails = AdditiveSystemBuilder::new(
            1,
            1,
            shift,
            shift,
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(PointMass::scalar(0.0)),
            Arc::new(Exhausted),
            3,
        );
        assert!(matches!(
            observation_fails.build(&mut rng),
            Err(SystemError::Sampling(_))
        ));
    }

    #[test]
    fn test_mean_captures_sample_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let process = Univariate::normal(0.0, 1.0).unwrap();
        let samples = process.sample_n(6, &mut rng).unwrap();
        let mean = MonteCarloMean::new(Arc::new(shift), samples.clone(), 1, MeanReduction::Scalar);

        assert_eq!(mean.samples().len(), 6);
        assert_eq!(mean.samples(), samples.as_slice());
        assert_eq!(mean.reduction(), MeanReduction::Scalar);

        let expected = samples.iter().map(|w| w[0]).sum::<f64>() / 6.0;
        let fx = mean.apply(&v(&[0.0])).unwrap();
        assert!((fx[0] - expected).abs() < 1e-10);
    }

    #[test]
    fn test_scalar_mean_of_empty_outputs_is_nan() {
        let raw: Arc<dyn NoisyMap> =
            Arc::new(|_x: &DVector<f64>, _w: &DVector<f64>| DVector::<f64>::zeros(0));
        let mean = MonteCarloMean::new(raw, vec![v(&[1.0])], 1, MeanReduction::Scalar);
        assert!(mean.apply(&v(&[0.0])).unwrap()[0].is_nan());
    }

    #[test]
    fn test_from_config_applies_reduction() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = AdditiveConfig {
            state_dim: 2,
            output_dim: 2,
            sample_count: 2,
            reduction: MeanReduction::Elementwise,
        };
        let builder = AdditiveSystemBuilder::from_config(
            &config,
            |x: &DVector<f64>, w: &DVector<f64>| x + w,
            |x: &DVector<f64>, w: &DVector<f64>| x + w,
            Arc::new(PointMass::zeros(2)),
            Arc::new(PointMass::zeros(2)),
            Arc::new(PointMass::zeros(2)),
        )
        .unwrap();
        assert_eq!(builder.sample_count(), 2);

        let system = builder.build(&mut rng).unwrap();
        let fx = system.transition_map().apply(&v(&[1.0, 3.0])).unwrap();
        assert_eq!(fx, v(&[1.0, 3.0]));
    }
}
