use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::telemetry::RetryPolicy;
use crate::vehicle::{default_stages, StageDescriptor};

// ---------------------------------------------------------------------------
// Ascent tunables
// ---------------------------------------------------------------------------

/// Shape of the pitch program between the turn start and end altitudes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PitchProfile {
    /// Pitch falls linearly with altitude.
    Linear,
    /// pitch = 90 * (1 - f^exponent); exponents below 1 turn harder early.
    Power { exponent: f64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AscentConfig {
    pub turn_start_altitude: f64,          // m
    pub turn_end_altitude: Option<f64>,    // m, None = target altitude
    pub pitch_profile: PitchProfile,
    pub apoapsis_throttle_band: f64,       // m below target where throttle eases off
    pub min_throttle: f64,
    pub circularization_lead: f64,         // s added before apoapsis ignition
    pub orbit_tolerance: f64,              // m, allowed apsis error
    pub correct_apsides: bool,
    pub max_trims: u32,
    pub cutoff_delta_v: f64,               // m/s, remaining dv that counts as done
    pub tail_time: f64,                    // s of full-thrust burn left when throttling down
    pub max_steering_error: f64,           // deg, throttle held at zero beyond this
}

impl Default for AscentConfig {
    fn default() -> Self {
        Self {
            turn_start_altitude: 1_000.0,
            turn_end_altitude: None,
            pitch_profile: PitchProfile::Power { exponent: 0.6 },
            apoapsis_throttle_band: 5_000.0,
            min_throttle: 0.02,
            circularization_lead: 5.0,
            orbit_tolerance: 500.0,
            correct_apsides: true,
            max_trims: 4,
            cutoff_delta_v: 0.1,
            tail_time: 2.0,
            max_steering_error: 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Maneuver tunables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManeuverConfig {
    /// Largest eccentricity accepted as "circular" for a Hohmann departure.
    pub max_eccentricity: f64,
    /// Minimum time between planning and ignition (s).
    pub min_lead_time: f64,
    /// Attitude error allowed at ignition (deg).
    pub alignment_tolerance: f64,
    pub cutoff_delta_v: f64,
    /// Seconds of full-thrust burn left when the throttle starts easing off;
    /// 0 holds full throttle until cutoff.
    pub tail_time: f64,
    pub min_throttle: f64,
}

impl Default for ManeuverConfig {
    fn default() -> Self {
        Self {
            max_eccentricity: 0.01,
            min_lead_time: 30.0,
            alignment_tolerance: 1.0,
            cutoff_delta_v: 0.2,
            tail_time: 2.0,
            min_throttle: 0.02,
        }
    }
}

// ---------------------------------------------------------------------------
// Control loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Simulation seconds between decisions.
    pub tick: f64,
    pub retry: RetryPolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { tick: 0.1, retry: RetryPolicy::default() }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub ascent: AscentConfig,
    pub maneuver: ManeuverConfig,
    pub control: LoopConfig,
    pub stages: Vec<StageDescriptor>,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            ascent: AscentConfig::default(),
            maneuver: ManeuverConfig::default(),
            control: LoopConfig::default(),
            stages: default_stages(),
        }
    }
}

impl FlightConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FlightConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        let a = &self.ascent;
        if !(self.control.tick > 0.0 && self.control.tick.is_finite()) {
            return invalid("control.tick must be positive");
        }
        if self.control.retry.max_attempts == 0 {
            return invalid("control.retry.max_attempts must be at least 1");
        }
        if self.stages.is_empty() {
            return invalid("at least one stage is required");
        }
        if self.stages.iter().any(|s| !(0.0..1.0).contains(&s.decouple_below)) {
            return invalid("stages.decouple_below must lie in [0, 1)");
        }
        if a.turn_start_altitude < 0.0 {
            return invalid("ascent.turn_start_altitude must be >= 0");
        }
        if let Some(end) = a.turn_end_altitude {
            if end <= a.turn_start_altitude {
                return invalid("ascent.turn_end_altitude must be above turn_start_altitude");
            }
        }
        if let PitchProfile::Power { exponent } = a.pitch_profile {
            if !(exponent > 0.0 && exponent.is_finite()) {
                return invalid("ascent.pitch_profile.exponent must be positive");
            }
        }
        if !(0.0..=1.0).contains(&a.min_throttle) || !(0.0..=1.0).contains(&self.maneuver.min_throttle) {
            return invalid("min_throttle must lie in [0, 1]");
        }
        if a.apoapsis_throttle_band <= 0.0 {
            return invalid("ascent.apoapsis_throttle_band must be positive");
        }
        if a.tail_time < 0.0 || self.maneuver.tail_time < 0.0 {
            return invalid("tail_time must be >= 0 (0 burns at full throttle to cutoff)");
        }
        if a.orbit_tolerance <= 0.0 {
            return invalid("ascent.orbit_tolerance must be positive");
        }
        if self.maneuver.max_eccentricity < 0.0 || self.maneuver.max_eccentricity >= 1.0 {
            return invalid("maneuver.max_eccentricity must lie in [0, 1)");
        }
        Ok(())
    }
}
