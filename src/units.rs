//! Laser power entry
//!
//! Operators enter power in watts within a range that depends on the power
//! mode; the model works in milliwatts.

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Milliwatts per watt
pub const MILLIWATTS_PER_WATT: f64 = 1000.0;

pub fn watts_to_milliwatts(watts: f64) -> f64 {
    watts * MILLIWATTS_PER_WATT
}

/// Power entry range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerMode {
    /// 0.5 to 30 W
    #[default]
    High,
    /// 0.005 to 0.5 W
    Low,
}

/// Inclusive watt range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerBounds {
    pub min: f64,
    pub max: f64,
}

impl PowerBounds {
    pub fn contains(&self, watts: f64) -> bool {
        watts >= self.min && watts <= self.max
    }

    pub fn clamp(&self, watts: f64) -> f64 {
        watts.clamp(self.min, self.max)
    }
}

impl PowerMode {
    pub fn bounds(self) -> PowerBounds {
        match self {
            PowerMode::High => PowerBounds { min: 0.5, max: 30.0 },
            PowerMode::Low => PowerBounds { min: 0.005, max: 0.5 },
        }
    }

    /// Value shown when the mode is first selected
    pub fn default_watts(self) -> f64 {
        match self {
            PowerMode::High => 0.5,
            PowerMode::Low => 0.05,
        }
    }
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerMode::High => write!(f, "high"),
            PowerMode::Low => write!(f, "low"),
        }
    }
}

impl FromStr for PowerMode {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(PowerMode::High),
            "low" | "l" => Ok(PowerMode::Low),
            other => Err(PredictorError::ValidationError(format!(
                "unknown power mode '{}', expected high or low",
                other
            ))),
        }
    }
}

/// A watt value that always lies within its mode's bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSetting {
    mode: PowerMode,
    watts: f64,
}

impl Default for PowerSetting {
    fn default() -> Self {
        Self::new(PowerMode::default())
    }
}

impl PowerSetting {
    /// Setting at the mode's default value
    pub fn new(mode: PowerMode) -> Self {
        Self {
            mode,
            watts: mode.default_watts(),
        }
    }

    /// Set the watt value, clamped into the current bounds. Returns the
    /// stored value.
    pub fn set_watts(&mut self, watts: f64) -> Result<f64> {
        if !watts.is_finite() {
            return Err(PredictorError::ValidationError(format!(
                "power must be a finite number of watts, got {}",
                watts
            )));
        }
        self.watts = self.bounds().clamp(watts);
        Ok(self.watts)
    }

    /// Switch mode; the current value is clamped into the new bounds
    pub fn switch_mode(&mut self, mode: PowerMode) {
        self.mode = mode;
        self.watts = mode.bounds().clamp(self.watts);
    }

    pub fn mode(&self) -> PowerMode {
        self.mode
    }

    pub fn bounds(&self) -> PowerBounds {
        self.mode.bounds()
    }

    pub fn watts(&self) -> f64 {
        self.watts
    }

    /// The value handed to the model as `Power (mW)`
    pub fn milliwatts(&self) -> f64 {
        watts_to_milliwatts(self.watts)
    }
}
