use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Transport errors (remote link)
// ---------------------------------------------------------------------------

/// Failures reported by the remote telemetry/control link.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    #[error("endpoint `{0}` is unreachable")]
    Unreachable(String),
    #[error("link dropped: {0}")]
    Dropped(String),
    #[error("telemetry request timed out")]
    Timeout,
    #[error("remote call still failing after {attempts} attempts")]
    RetryBudgetExhausted { attempts: u32 },
}

impl LinkError {
    /// Only timeouts are worth retrying; everything else means the session is gone.
    pub fn is_transient(&self) -> bool {
        matches!(self, LinkError::Timeout)
    }
}

// ---------------------------------------------------------------------------
// Flight phases (used to tag fatal conditions)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prelaunch,
    VerticalAscent,
    GravityTurn,
    CoastingToApoapsis,
    Circularizing,
    TrimmingApsides,
    OrbitAchieved,
    Aligning,
    Burning,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Prelaunch => "PRELAUNCH",
            Phase::VerticalAscent => "VERTICAL_ASCENT",
            Phase::GravityTurn => "GRAVITY_TURN",
            Phase::CoastingToApoapsis => "COASTING_TO_APOAPSIS",
            Phase::Circularizing => "CIRCULARIZING",
            Phase::TrimmingApsides => "TRIMMING_APSIDES",
            Phase::OrbitAchieved => "ORBIT_ACHIEVED",
            Phase::Aligning => "ALIGNING",
            Phase::Burning => "BURNING",
            Phase::Done => "DONE",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Every condition that aborts an ascent or transfer run.
///
/// The vehicle is left in its last commanded state; zeroing the throttle
/// after a failure is up to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlightError {
    #[error("connection error: {0}")]
    Connection(#[from] LinkError),
    #[error("stage {stage} ran dry during {phase}")]
    InsufficientFuel { phase: Phase, stage: usize },
    #[error("non-physical input: {0}")]
    NonPhysicalInput(String),
    #[error("no stage left to activate after stage {stage}")]
    StageSequenceExhausted { stage: usize },
    #[error("orbit eccentricity {eccentricity:.4} exceeds the {limit:.4} limit for a Hohmann departure")]
    OrbitNotCircular { eccentricity: f64, limit: f64 },
    #[error("unknown body `{0}`")]
    UnknownBody(String),
    #[error("`{target}` does not orbit `{body}`")]
    TargetNotInOrbitOf { target: String, body: String },
    #[error("run aborted by caller during {phase}")]
    Aborted { phase: Phase },
    #[error("invalid flight config: {0}")]
    InvalidConfig(String),
}

impl FlightError {
    pub(crate) fn non_physical(msg: impl Into<String>) -> Self {
        FlightError::NonPhysicalInput(msg.into())
    }
}

impl From<ConfigError> for FlightError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(msg) => FlightError::InvalidConfig(msg),
            other => FlightError::InvalidConfig(other.to_string()),
        }
    }
}

/// Errors raised while loading a flight configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
