// SPDX-License-Identifier: MIT

//! Engine configuration
//!
//! Loaded from a YAML file, then overridden by environment variables:
//! - `BPM_MAX_STEPS` - simulation step budget
//! - `BPM_UNKNOWN_RULES` - `fail-open` or `fail-closed`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::BpmError;

pub const MAX_STEPS_ENV: &str = "BPM_MAX_STEPS";
pub const UNKNOWN_RULES_ENV: &str = "BPM_UNKNOWN_RULES";

const DEFAULT_MAX_STEPS: usize = 1000;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub simulation: SimulationConfig,
    pub validation: ValidationConfig,
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Steps a single run may take before it is halted
    pub max_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Validation settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationConfig {
    pub unknown_rule_policy: UnknownRulePolicy,
}

/// What to do with a rule whose kind is not recognized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownRulePolicy {
    /// Log a warning and treat the rule as passing
    #[default]
    FailOpen,
    /// Report the rule as a validation error
    FailClosed,
}

impl FromStr for UnknownRulePolicy {
    type Err = BpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Ok(Self::FailOpen),
            "fail-closed" | "closed" => Ok(Self::FailClosed),
            other => Err(BpmError::config(format!(
                "Unknown rule policy '{}', expected fail-open or fail-closed",
                other
            ))),
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BpmError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, BpmError> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self, BpmError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, BpmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(MAX_STEPS_ENV) {
            self.simulation.max_steps = raw.trim().parse().map_err(|_| {
                BpmError::config(format!("{} must be a positive integer, got '{}'", MAX_STEPS_ENV, raw))
            })?;
        }
        if let Some(raw) = lookup(UNKNOWN_RULES_ENV) {
            self.validation.unknown_rule_policy = raw.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), BpmError> {
        if self.simulation.max_steps == 0 {
            return Err(BpmError::config("simulation.maxSteps must be greater than zero"));
        }
        Ok(())
    }
}
