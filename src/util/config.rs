//! Simulation settings.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults from `util::constants`
//! 2. An optional JSON file
//! 3. `ELEVATOR_*` environment variables
//!
//! ```json
//! { "floor_count": 12, "elevator_count": 3, "time_scale": 10.0 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::building::building::BuildingConfig;
use crate::util::constants as setting;
use crate::util::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub floor_count: u8,
    pub elevator_count: usize,
    pub max_weight: f64,
    /// Simulated milliseconds per tick.
    pub tick_ms: u64,
    pub door_open_ms: u64,
    /// feet per second
    pub speed: f64,
    /// feet
    pub floor_height: f64,
    /// How much faster than real time the simulation runs.
    pub time_scale: f64,

    /// Demo only: number of occupants entering the building.
    pub occupants: usize,
    /// Demo only: stop after this many completed trips.
    pub trips: usize,
    /// Demo only: give up after this many wall-clock seconds.
    pub deadline_secs: u64,
    pub min_occupant_weight: f64,
    pub max_occupant_weight: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            floor_count: setting::ELEV_NUM_FLOORS,
            elevator_count: setting::ELEV_COUNT,
            max_weight: setting::MAX_WEIGHT,
            tick_ms: setting::TICK_INTERVAL_MS,
            door_open_ms: setting::DOOR_OPEN_TIME_MS,
            speed: setting::ELEV_SPEED,
            floor_height: setting::FLOOR_HEIGHT,
            time_scale: 1.0,
            occupants: 4,
            trips: 8,
            deadline_secs: 300,
            min_occupant_weight: setting::OCCUPANT_WEIGHT * 0.5,
            max_occupant_weight: setting::OCCUPANT_WEIGHT * 1.5,
        }
    }
}

impl SimulationConfig {
    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<SimulationConfig> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        log::debug!("loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<SimulationConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let config = serde_json::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// `lookup` maps a variable name to its value, if set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_from(&lookup, "ELEVATOR_FLOOR_COUNT", &mut self.floor_count)?;
        override_from(&lookup, "ELEVATOR_ELEVATOR_COUNT", &mut self.elevator_count)?;
        override_from(&lookup, "ELEVATOR_MAX_WEIGHT", &mut self.max_weight)?;
        override_from(&lookup, "ELEVATOR_TICK_MS", &mut self.tick_ms)?;
        override_from(&lookup, "ELEVATOR_DOOR_OPEN_MS", &mut self.door_open_ms)?;
        override_from(&lookup, "ELEVATOR_SPEED", &mut self.speed)?;
        override_from(&lookup, "ELEVATOR_FLOOR_HEIGHT", &mut self.floor_height)?;
        override_from(&lookup, "ELEVATOR_TIME_SCALE", &mut self.time_scale)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.time_scale > 0.0) {
            return Err(Error::out_of_range("time_scale", self.time_scale, "must be greater than 0"));
        }
        if !(self.min_occupant_weight > 0.0) || self.min_occupant_weight > self.max_occupant_weight {
            return Err(Error::out_of_range(
                "min_occupant_weight",
                self.min_occupant_weight,
                "must be greater than 0 and at most max_occupant_weight",
            ));
        }
        self.building_config().validate()
    }

    pub fn building_config(&self) -> BuildingConfig {
        let tick = Duration::from_millis(self.tick_ms);
        let tick_interval = if self.time_scale > 0.0 {
            tick.div_f64(self.time_scale).max(Duration::from_millis(1))
        } else {
            tick
        };
        BuildingConfig {
            floor_count: self.floor_count,
            elevator_count: self.elevator_count,
            max_weight: self.max_weight,
            floor_height: self.floor_height,
            speed: self.speed,
            tick_interval,
            tick,
            door_open_time: Duration::from_millis(self.door_open_ms),
        }
    }
}

fn override_from<F, T>(lookup: &F, key: &'static str, field: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *field = raw.trim().parse().map_err(|e: T::Err| Error::Config {
            path: PathBuf::from(format!("${}", key)),
            detail: format!("cannot parse {:?}: {}", raw, e),
        })?;
        log::info!("using {} from environment", key);
    }
    Ok(())
}
