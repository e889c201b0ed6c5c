//! dynsys - discrete-time stochastic dynamical systems
//!
//! A uniform interface for estimation algorithms (filters, smoothers) to
//! propagate a state with process noise, produce noisy measurements, and
//! sample initial states. Additive-noise systems can be built from
//! noise-parameterized maps by Monte Carlo averaging.

pub mod additive;
pub mod config;
pub mod distribution;
pub mod error;
pub mod map;
pub mod sim;
pub mod system;

// Re-export main types
pub use additive::{AdditiveSystemBuilder, MeanReduction, MonteCarloMean};
pub use config::{AdditiveConfig, SimConfig};
pub use distribution::{Independent, MultivariateNormal, PointMass, Sampler, Univariate};
pub use error::{Result, SystemError};
pub use map::{NoisyMap, VectorMap};
pub use system::System;
