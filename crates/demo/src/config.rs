//! Demo configuration (environment driven).

use std::time::Duration;

use thiserror::Error;

pub const SEED_ENV: &str = "SCRY_DEMO_SEED";
pub const MAX_TURNS_ENV: &str = "SCRY_DEMO_MAX_TURNS";
pub const PAUSE_MS_ENV: &str = "SCRY_DEMO_PAUSE_MS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// Settings of one scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Seed of the wizard's clumsiness.
    pub seed: u64,
    /// Upper bound on wizard turns.
    pub max_turns: usize,
    /// Pause between turns (zero in tests).
    pub pause: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            max_turns: 20,
            pause: Duration::ZERO,
        }
    }
}

impl DemoConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let seed = parse(&lookup, SEED_ENV)?.unwrap_or(defaults.seed);
        let max_turns = match parse(&lookup, MAX_TURNS_ENV)? {
            Some(0) => return Err(ConfigError::Zero(MAX_TURNS_ENV)),
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
            None => defaults.max_turns,
        };
        let pause = parse(&lookup, PAUSE_MS_ENV)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.pause);

        Ok(Self {
            seed,
            max_turns,
            pause,
        })
    }
}

fn parse(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::NotANumber { var, value })
}
