//! Sampling capability for initial-state and noise distributions
//!
//! A [`Sampler`] draws `n` real-valued vectors from some distribution. One
//! draw may be a single scalar (a length-1 vector) or span several
//! components; the flattened element count across all draws is what
//! callers reshape against.

use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::error::{Result, SystemError};

/// Draws real-valued samples from a fixed distribution
pub trait Sampler: Send + Sync {
    /// Draw `n` samples, one vector per draw
    fn sample_n(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<DVector<f64>>>;

    /// Draw a single sample
    fn draw(&self, rng: &mut dyn RngCore) -> Result<DVector<f64>> {
        self.sample_n(1, rng)?
            .pop()
            .ok_or_else(|| SystemError::Sampling("sampler returned no draws".to_string()))
    }
}

/// Scalar distribution; every draw is a length-1 vector
#[derive(Debug, Clone)]
pub struct Univariate<D> {
    dist: D,
}

impl<D: Distribution<f64>> Univariate<D> {
    pub fn new(dist: D) -> Self {
        Self { dist }
    }
}

impl Univariate<Normal<f64>> {
    /// Gaussian with the given mean and standard deviation
    pub fn normal(mean: f64, std_dev: f64) -> Result<Self> {
        if !(std_dev >= 0.0 && std_dev.is_finite()) {
            return Err(SystemError::Sampling(format!(
                "normal({mean}, {std_dev}): standard deviation must be finite and non-negative"
            )));
        }
        Normal::new(mean, std_dev)
            .map(Self::new)
            .map_err(|e| SystemError::Sampling(format!("normal({mean}, {std_dev}): {e}")))
    }
}

impl<D: Distribution<f64> + Send + Sync> Sampler for Univariate<D> {
    fn sample_n(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<DVector<f64>>> {
        let mut draws = Vec::with_capacity(n);
        for _ in 0..n {
            draws.push(DVector::from_element(1, self.dist.sample(rng)));
        }
        Ok(draws)
    }
}

/// Product of independent scalar components; every draw has one entry per component
#[derive(Debug, Clone)]
pub struct Independent<D> {
    components: Vec<D>,
}

impl<D: Distribution<f64>> Independent<D> {
    pub fn new(components: Vec<D>) -> Self {
        Self { components }
    }

    pub fn dim(&self) -> usize {
        self.components.len()
    }
}

impl<D: Distribution<f64> + Clone> Independent<D> {
    /// `dim` identically distributed components
    pub fn iid(dist: D, dim: usize) -> Self {
        Self::new(vec![dist; dim])
    }
}

impl<D: Distribution<f64> + Send + Sync> Sampler for Independent<D> {
    fn sample_n(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<DVector<f64>>> {
        let mut draws = Vec::with_capacity(n);
        for _ in 0..n {
            let mut draw = DVector::zeros(self.components.len());
            for (slot, dist) in draw.iter_mut().zip(self.components.iter()) {
                *slot = dist.sample(rng);
            }
            draws.push(draw);
        }
        Ok(draws)
    }
}

/// Gaussian with full covariance, sampled through its Cholesky factor
#[derive(Debug, Clone)]
pub struct MultivariateNormal {
    mean: DVector<f64>,
    factor: DMatrix<f64>,
}

impl MultivariateNormal {
    pub fn new(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self> {
        let dim = mean.len();
        if covariance.nrows() != dim || covariance.ncols() != dim {
            return Err(SystemError::Sampling(format!(
                "covariance is {}x{}, mean has length {dim}",
                covariance.nrows(),
                covariance.ncols()
            )));
        }

        let scale = covariance.amax().max(1.0);
        if (&covariance - covariance.transpose()).amax() > 1e-12 * scale {
            return Err(SystemError::Sampling(
                "covariance is not symmetric".to_string(),
            ));
        }

        let factor = covariance
            .cholesky()
            .ok_or_else(|| {
                SystemError::Sampling("covariance is not positive definite".to_string())
            })?
            .l();

        Ok(Self { mean, factor })
    }

    /// Zero-mean Gaussian with `sigma^2 * I` covariance
    pub fn isotropic(dim: usize, sigma: f64) -> Result<Self> {
        Self::new(
            DVector::zeros(dim),
            DMatrix::from_diagonal_element(dim, dim, sigma * sigma),
        )
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }
}

impl Sampler for MultivariateNormal {
    fn sample_n(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<DVector<f64>>> {
        let dim = self.mean.len();
        let mut draws = Vec::with_capacity(n);
        for _ in 0..n {
            let mut z = DVector::zeros(dim);
            for slot in z.iter_mut() {
                *slot = StandardNormal.sample(rng);
            }
            draws.push(&self.mean + &self.factor * z);
        }
        Ok(draws)
    }
}

/// Degenerate distribution that always yields the same vector
#[derive(Debug, Clone, PartialEq)]
pub struct PointMass {
    value: DVector<f64>,
}

impl PointMass {
    pub fn new(value: DVector<f64>) -> Self {
        Self { value }
    }

    pub fn scalar(value: f64) -> Self {
        Self::new(DVector::from_element(1, value))
    }

    pub fn zeros(dim: usize) -> Self {
        Self::new(DVector::zeros(dim))
    }
}

impl Sampler for PointMass {
    fn sample_n(&self, n: usize, _rng: &mut dyn RngCore) -> Result<Vec<DVector<f64>>> {
        Ok(vec![self.value.clone(); n])
    }
}
