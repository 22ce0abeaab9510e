//! Configuration management for the ratecount meter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{RateCountError, Result};
use crate::rate::{RateCounter, Unit};

/// Main configuration for the ratecount meter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Counter and reporting configuration
    #[serde(default)]
    pub meter: MeterSettings,
}

/// Counter and reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterSettings {
    /// Width of one slot in milliseconds
    #[serde(default = "default_resolution_ms")]
    pub resolution_ms: u64,

    /// Number of closed slots averaged into the reported rate
    #[serde(default = "default_windows")]
    pub windows: usize,

    /// How often the current rate is logged, in milliseconds
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    /// Unit the rate is reported in
    #[serde(default)]
    pub unit: Unit,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            resolution_ms: default_resolution_ms(),
            windows: default_windows(),
            report_interval_ms: default_report_interval_ms(),
            unit: Unit::default(),
        }
    }
}

fn default_resolution_ms() -> u64 {
    1000
}

fn default_windows() -> usize {
    5
}

fn default_report_interval_ms() -> u64 {
    1000
}

impl MeterSettings {
    /// Get the slot width.
    pub fn resolution(&self) -> Duration {
        Duration::from_millis(self.resolution_ms)
    }

    /// Get the reporting interval.
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

impl MeterConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading meter configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: MeterConfig = serde_yaml::from_str(yaml)
            .map_err(|e| RateCountError::Config(format!("Failed to parse meter config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings a counter cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.meter.report_interval_ms == 0 {
            return Err(RateCountError::Config(
                "report_interval_ms must be greater than zero".to_string(),
            ));
        }
        self.build_counter().map(|_| ())
    }

    /// Build a counter from these settings.
    pub fn build_counter(&self) -> Result<RateCounter> {
        RateCounter::new(self.meter.resolution(), self.meter.windows)
    }
}
