//! Function capabilities for transition and observation maps

use nalgebra::DVector;

use crate::error::Result;

/// Pure vector-to-vector function, e.g. a noise-free transition or observation map.
///
/// Closures of type `Fn(&DVector<f64>) -> DVector<f64>` implement this
/// directly. Implement it by hand when the map can fail.
pub trait VectorMap: Send + Sync {
    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>>;
}

impl<F> VectorMap for F
where
    F: Fn(&DVector<f64>) -> DVector<f64> + Send + Sync,
{
    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(self(x))
    }
}

/// Noise-parameterized map `(x, noise) -> y`
pub trait NoisyMap: Send + Sync {
    fn apply(&self, x: &DVector<f64>, noise: &DVector<f64>) -> Result<DVector<f64>>;
}

impl<F> NoisyMap for F
where
    F: Fn(&DVector<f64>, &DVector<f64>) -> DVector<f64> + Send + Sync,
{
    fn apply(&self, x: &DVector<f64>, noise: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(self(x, noise))
    }
}
