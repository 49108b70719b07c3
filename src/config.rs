//! Tunable constants, loadable from TOML.
//!
//! Every section uses `#[serde(default)]`, so a file that only overrides
//! `[debounce]` keeps the defaults everywhere else.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::PuppetError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuppetConfig {
    pub debounce: DebounceConfig,
    pub damping: DampingConfig,
    pub idle: IdleConfig,
    pub mapper: MapperConfig,
    pub driver: DriverConfig,
}

/// Persistence rules that turn raw labels into a stable one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Consecutive identical raw labels needed to report a label.
    pub min_consecutive: u32,
    /// How many of the newest history entries the recall check looks at.
    pub window: usize,
    /// Occurrences inside `window` that also report the label.
    pub min_in_window: usize,
    pub history_len: usize,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            min_consecutive: 3,
            window: 5,
            min_in_window: 3,
            history_len: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DampingConfig {
    /// Fraction of the gap left after one second of smoothing.
    pub residual_per_second: f32,
    /// Wave phase advance in radians per second.
    pub wave_speed: f32,
    pub wave_amplitude: f32,
    pub wave_offset: f32,
    pub smile_head_scale: f32,
    pub gesture_hand_scale: f32,
}

impl Default for DampingConfig {
    fn default() -> Self {
        Self {
            residual_per_second: 0.01,
            wave_speed: 8.0,
            wave_amplitude: 0.5,
            wave_offset: 0.5,
            smile_head_scale: 1.05,
            gesture_hand_scale: 1.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub bob_frequency: f32,
    pub bob_amplitude: f32,
    pub sway_frequency: f32,
    pub sway_amplitude: f32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            bob_frequency: 2.0,
            bob_amplitude: 0.1,
            sway_frequency: 0.5,
            sway_amplitude: 0.1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Pose landmarks reporting a lower visibility are ignored.
    pub min_visibility: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Nominal time between frames.
    pub frame_interval_ms: u64,
    /// Silence longer than this produces an in-between tick. Must exceed the
    /// frame interval so on-time frames never race it.
    pub gap_timeout_ms: u64,
    /// Upper bound on a single tick's dt in seconds.
    pub max_dt: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33,
            gap_timeout_ms: 100,
            max_dt: 0.25,
        }
    }
}

impl DriverConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn gap_timeout(&self) -> Duration {
        Duration::from_millis(self.gap_timeout_ms)
    }
}

impl PuppetConfig {
    /// Load from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, PuppetError> {
        let content = fs::read_to_string(path).map_err(|source| PuppetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, PuppetError> {
        let config: PuppetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, PuppetError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PuppetError> {
        let content = self.to_toml()?;
        let io_err = |source| PuppetError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, content).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), PuppetError> {
        let debounce = &self.debounce;
        if debounce.window == 0 {
            return Err(PuppetError::InvalidConfig(
                "debounce.window must be at least 1".into(),
            ));
        }
        if debounce.history_len < debounce.window {
            return Err(PuppetError::InvalidConfig(format!(
                "debounce.history_len ({}) is shorter than debounce.window ({})",
                debounce.history_len, debounce.window
            )));
        }
        let residual = self.damping.residual_per_second;
        if !(residual > 0.0 && residual < 1.0) {
            return Err(PuppetError::InvalidConfig(format!(
                "damping.residual_per_second must be in (0, 1), got {residual}"
            )));
        }
        if self.driver.frame_interval_ms == 0 {
            return Err(PuppetError::InvalidConfig(
                "driver.frame_interval_ms must be positive".into(),
            ));
        }
        if self.driver.gap_timeout_ms <= self.driver.frame_interval_ms {
            return Err(PuppetError::InvalidConfig(format!(
                "driver.gap_timeout_ms ({}) must exceed driver.frame_interval_ms ({})",
                self.driver.gap_timeout_ms, self.driver.frame_interval_ms
            )));
        }
        if !(self.driver.max_dt > 0.0) {
            return Err(PuppetError::InvalidConfig(
                "driver.max_dt must be positive".into(),
            ));
        }
        Ok(())
    }
}
