// ---------------------------------------------------------------------------
// Control command: everything the autopilot sends in one tick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageAction {
    #[default]
    None,
    /// Fire the next stage event (ignition on the pad, decouple in flight).
    Activate,
}

/// One atomic set of control inputs.
///
/// `pitch` is degrees above the horizon, `heading` is a compass heading
/// (east = 90). With `autopilot == false` the attitude hold is released and
/// pitch/heading are ignored by the vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlCommand {
    pub throttle: f64,
    pub pitch: f64,
    pub heading: f64,
    pub stage: StageAction,
    pub autopilot: bool,
}

impl ControlCommand {
    /// Attitude-held command; throttle is clamped into [0, 1].
    pub fn steer(throttle: f64, pitch: f64, heading: f64) -> Self {
        let throttle = if throttle.is_nan() { 0.0 } else { throttle.clamp(0.0, 1.0) };
        Self {
            throttle,
            pitch: pitch.clamp(-90.0, 90.0),
            heading: heading.rem_euclid(360.0),
            stage: StageAction::None,
            autopilot: true,
        }
    }

    /// Engines off with attitude hold released.
    pub fn release() -> Self {
        Self {
            throttle: 0.0,
            pitch: 0.0,
            heading: 0.0,
            stage: StageAction::None,
            autopilot: false,
        }
    }

    pub fn with_stage(mut self) -> Self {
        self.stage = StageAction::Activate;
        self
    }

    pub fn stages(&self) -> bool {
        self.stage == StageAction::Activate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_is_clamped() {
        assert_eq!(ControlCommand::steer(1.7, 0.0, 90.0).throttle, 1.0);
        assert_eq!(ControlCommand::steer(-0.2, 0.0, 90.0).throttle, 0.0);
        assert_eq!(ControlCommand::steer(f64::NAN, 0.0, 90.0).throttle, 0.0);
    }

    #[test]
    fn heading_wraps() {
        assert_eq!(ControlCommand::steer(1.0, 0.0, -90.0).heading, 270.0);
        assert_eq!(ControlCommand::steer(1.0, 0.0, 450.0).heading, 90.0);
    }

    #[test]
    fn release_drops_autopilot() {
        let cmd = ControlCommand::release();
        assert!(!cmd.autopilot);
        assert_eq!(cmd.throttle, 0.0);
        assert!(!cmd.stages());
        assert!(ControlCommand::steer(1.0, 90.0, 90.0).with_stage().stages());
    }
}
