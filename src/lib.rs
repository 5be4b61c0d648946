pub mod boids;
pub mod config;
pub mod sink;
pub mod wire;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flocking parameters, fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub visual_range: f32,
    pub protected_range: f32,
    pub separation_factor: f32,
    pub alignment_factor: f32,
    pub cohesion_factor: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Half-width of the square world; boids bounce off `±margin`.
    pub margin: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            visual_range: 2.0,
            protected_range: 0.5,
            separation_factor: 0.05,
            alignment_factor: 0.05,
            cohesion_factor: 0.01,
            min_speed: 0.05,
            max_speed: 0.2,
            margin: 10.0,
        }
    }
}

impl Parameters {
    /// Checks the invariants the update step relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("visual_range", self.visual_range),
            ("protected_range", self.protected_range),
            ("separation_factor", self.separation_factor),
            ("alignment_factor", self.alignment_factor),
            ("cohesion_factor", self.cohesion_factor),
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
            ("margin", self.margin),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        if self.protected_range >= self.visual_range {
            return Err(ConfigError::Ranges {
                protected: self.protected_range,
                visual: self.visual_range,
            });
        }
        if self.min_speed >= self.max_speed {
            return Err(ConfigError::Speeds {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.margin == 0.0 {
            return Err(ConfigError::EmptyWorld);
        }
        Ok(())
    }
}

/// Checks a half-width used for `[-value, value]` sampling.
pub(crate) fn check_spawn_range(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { name, value });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }
    if !(value * 2.0).is_finite() {
        return Err(ConfigError::SpawnRange { name, value });
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("protected_range ({protected}) must be smaller than visual_range ({visual})")]
    Ranges { protected: f32, visual: f32 },

    #[error("min_speed ({min}) must be smaller than max_speed ({max})")]
    Speeds { min: f32, max: f32 },

    #[error("{name} ({value}) spans a range too wide to sample from")]
    SpawnRange { name: &'static str, value: f32 },

    #[error("margin must be greater than zero")]
    EmptyWorld,

    #[error("tick delay must be at least one millisecond")]
    TickDelay,

    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
