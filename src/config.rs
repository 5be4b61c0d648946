use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Parameters, check_spawn_range};

pub const DEFAULT_ENDPOINT: &str = "tcp://127.0.0.1:5555";

/// Everything needed to start a run. Missing JSON keys fall back to the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub boids: usize,
    /// Boids spawn in `[-spawn_bounds, spawn_bounds]²`.
    pub spawn_bounds: f32,
    /// Initial velocity components are drawn from `[-initial_speed, initial_speed]`.
    pub initial_speed: f32,
    pub tick_delay_ms: u64,
    pub endpoint: String,
    pub seed: Option<u64>,
    /// Stop after this many ticks; run forever when unset.
    pub max_ticks: Option<u64>,
    pub params: Parameters,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            boids: 50,
            spawn_bounds: 9.0,
            initial_speed: 0.1,
            tick_delay_ms: 16,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            seed: None,
            max_ticks: None,
            params: Parameters::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        for (name, value) in [
            ("spawn_bounds", self.spawn_bounds),
            ("initial_speed", self.initial_speed),
        ] {
            check_spawn_range(name, value)?;
        }
        if self.tick_delay_ms == 0 {
            return Err(ConfigError::TickDelay);
        }
        Ok(())
    }

    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(SimConfig::from_json_str("{}").unwrap(), SimConfig::default());
    }

    #[test]
    fn partial_params_keep_other_defaults() {
        let config =
            SimConfig::from_json_str(r#"{"boids": 120, "params": {"max_speed": 0.4}}"#).unwrap();
        assert_eq!(config.boids, 120);
        assert_eq!(config.params.max_speed, 0.4);
        assert_eq!(config.params.visual_range, Parameters::default().visual_range);
    }

    #[test]
    fn invalid_params_fail_at_load() {
        let result = SimConfig::from_json_str(r#"{"params": {"protected_range": 5.0}}"#);
        assert!(matches!(result, Err(ConfigError::Ranges { .. })));
    }

    #[test]
    fn oversized_spawn_bounds_fail_at_load() {
        let result = SimConfig::from_json_str(r#"{"spawn_bounds": 3e38}"#);
        assert!(matches!(result, Err(ConfigError::SpawnRange { .. })));
    }

    #[test]
    fn zero_tick_delay_is_rejected() {
        let result = SimConfig::from_json_str(r#"{"tick_delay_ms": 0}"#);
        assert!(matches!(result, Err(ConfigError::TickDelay)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimConfig::from_json_str("{boids: 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = SimConfig::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn printed_config_loads_back() {
        let config = SimConfig {
            seed: Some(42),
            max_ticks: Some(10),
            ..SimConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json_str(&json).unwrap(), config);
    }
}
