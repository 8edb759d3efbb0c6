//! Simulation configuration accepted from the host application.

use serde::{Deserialize, Serialize};

use crate::automaton::coord::Extent;
use crate::automaton::rules::Rule;
use crate::error::{LifeError, LifeResult};
use crate::pool::PoolSizing;

/// Everything the controller needs to run. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// Cells per axis of the cubic grid.
    pub grid_size: u32,
    pub steps_per_second: f64,
    pub rule: Rule,
    pub pool: PoolSizing,
    /// Build the pool up to its default size at construction.
    pub prewarm: bool,
    /// Threads used to count neighbors during a step; 0 means 1.
    pub worker_threads: u8,
    /// Most steps a single `tick` may run when catching up.
    pub max_steps_per_tick: u32,
}

impl Default for LifeConfig {
    fn default() -> Self {
        LifeConfig {
            grid_size: 20,
            steps_per_second: 4.0,
            rule: Rule::default(),
            pool: PoolSizing::default(),
            prewarm: true,
            worker_threads: 1,
            max_steps_per_tick: 8,
        }
    }
}

impl LifeConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> LifeResult<Self> {
        let config: LifeConfig = serde_json::from_str(json)
            .map_err(|e| LifeError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> LifeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LifeError::InvalidConfiguration(e.to_string()))
    }

    /// Reject the first offending field.
    pub fn validate(&self) -> LifeResult<()> {
        Extent::new(self.grid_size)?;
        validate_speed(self.steps_per_second)?;
        self.rule.validate()?;
        self.pool.validate()?;
        if self.max_steps_per_tick == 0 {
            return Err(LifeError::InvalidConfiguration(
                "max_steps_per_tick must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The validated grid extent.
    pub fn extent(&self) -> LifeResult<Extent> {
        Extent::new(self.grid_size)
    }
}

/// Step rates must be finite and positive.
pub fn validate_speed(steps_per_second: f64) -> LifeResult<()> {
    if !steps_per_second.is_finite() || steps_per_second <= 0.0 {
        return Err(LifeError::InvalidConfiguration(format!(
            "steps per second must be positive, got {steps_per_second}"
        )));
    }
    Ok(())
}
