//! Configuration for additive-system construction and simulation runs

use serde::{Deserialize, Serialize};

use crate::additive::MeanReduction;
use crate::error::{Result, SystemError};

/// Dimensions and Monte Carlo settings for [`crate::AdditiveSystemBuilder`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditiveConfig {
    pub state_dim: usize,
    pub output_dim: usize,
    pub sample_count: usize,
    pub reduction: MeanReduction,
}

impl Default for AdditiveConfig {
    fn default() -> Self {
        Self {
            state_dim: 1,
            output_dim: 1,
            sample_count: 1000,
            reduction: MeanReduction::Scalar,
        }
    }
}

impl AdditiveConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.state_dim == 0 {
            return Err(SystemError::InvalidConfig(
                "state_dim must be greater than zero".to_string(),
            ));
        }

        if self.output_dim == 0 {
            return Err(SystemError::InvalidConfig(
                "output_dim must be greater than zero".to_string(),
            ));
        }

        if self.sample_count == 0 {
            return Err(SystemError::InvalidConfig(
                "sample_count must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Simulation run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub steps: usize,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Parse settings; every `steps`/`seed` pair is a valid run.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
