//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Per-kind behaviour parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Lower bound (inclusive) of a spawned fish's action period
    pub fish_corrupt_min: u64,
    /// Upper bound (exclusive) of a spawned fish's action period
    pub fish_corrupt_max: u64,
    /// A crab born from a fish acts this many times faster than the fish
    pub crab_period_scale: u64,
    /// Lower bound (inclusive) of a spawned crab's animation period
    pub crab_animation_min: u64,
    /// Upper bound (exclusive) of a spawned crab's animation period
    pub crab_animation_max: u64,
    /// Delay before a quake removes itself
    pub quake_action_period: u64,
    pub quake_animation_period: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            fish_corrupt_min: 20_000,
            fish_corrupt_max: 30_000,
            crab_period_scale: 4,
            crab_animation_min: 50,
            crab_animation_max: 150,
            quake_action_period: 1_100,
            quake_animation_period: 100,
        }
    }
}

impl BehaviorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fish_corrupt_min >= self.fish_corrupt_max {
            return Err(Error::Config(format!(
                "fish corruption range is empty: [{}, {})",
                self.fish_corrupt_min, self.fish_corrupt_max
            )));
        }
        if self.crab_animation_min >= self.crab_animation_max {
            return Err(Error::Config(format!(
                "crab animation range is empty: [{}, {})",
                self.crab_animation_min, self.crab_animation_max
            )));
        }
        if self.crab_period_scale == 0 {
            return Err(Error::Config("crab_period_scale must be positive".to_string()));
        }
        Ok(())
    }
}

/// Event scheduler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Multiplier applied to every scheduling delay
    pub time_scale: f64,
    /// Frames a quake plays before its animation stops
    pub quake_animation_repeat: u32,
    /// Frames atlantis plays each time an octopus arrives
    pub atlantis_animation_repeat: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            quake_animation_repeat: 10,
            atlantis_animation_repeat: 7,
        }
    }
}

/// Top-level simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Logical milliseconds between driver steps
    pub tick_period_ms: u64,
    /// Logical milliseconds to run before stopping
    pub duration_ms: u64,
    /// Interval between population reports (real milliseconds)
    pub report_interval_ms: u64,
    pub scheduler: SchedulerConfig,
    pub behavior: BehaviorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_period_ms: 100,
            duration_ms: 120_000,
            report_interval_ms: 5_000,
            scheduler: SchedulerConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.scheduler.time_scale.is_finite() && self.scheduler.time_scale > 0.0) {
            return Err(Error::Config(format!(
                "time_scale must be a positive number, got {}",
                self.scheduler.time_scale
            )));
        }
        if self.tick_period_ms == 0 {
            return Err(Error::Config("tick_period_ms must be positive".to_string()));
        }
        self.behavior.validate()
    }
}
