use nalgebra::Vector3;

use crate::config::ManeuverConfig;
use crate::error::{FlightError, Phase};
use crate::vehicle::snapshot::{angle_between, pitch_heading_of};
use crate::vehicle::{ControlCommand, StageSequence, VehicleSnapshot};

use super::controller::Controller;
use super::delta_v::DeltaVMeter;
use super::guidance::tail_throttle;
use super::planner::ManeuverNode;

// ---------------------------------------------------------------------------
// Maneuver executor: ALIGNING -> BURNING -> DONE
// ---------------------------------------------------------------------------

/// Flies one maneuver node. The burn is cut on measured delta-v; the node is
/// never re-planned while burning.
#[derive(Debug)]
pub struct ManeuverExecutor {
    node: ManeuverNode,
    config: ManeuverConfig,
    stages: StageSequence,
    phase: Phase,
    meter: DeltaVMeter,
    late_warned: bool,
}

impl ManeuverExecutor {
    pub fn new(node: ManeuverNode, config: ManeuverConfig, stages: StageSequence) -> Self {
        Self {
            node,
            config,
            stages,
            phase: Phase::Aligning,
            meter: DeltaVMeter::new(),
            late_warned: false,
        }
    }

    pub fn node(&self) -> &ManeuverNode {
        &self.node
    }

    pub fn planned_delta_v(&self) -> f64 {
        self.node.delta_v.magnitude()
    }

    /// Delta-v delivered since ignition (m/s).
    pub fn achieved_delta_v(&self) -> f64 {
        self.meter.total()
    }

    /// Burn direction in the local frame: node components applied to the
    /// orbital frame of the current state.
    fn burn_direction(&self, s: &VehicleSnapshot) -> Vector3<f64> {
        let (prograde, normal, radial) = s.orbital_frame();
        let dv = &self.node.delta_v;
        prograde * dv.prograde + normal * dv.normal + radial * dv.radial
    }

    fn align(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        let dir = self.burn_direction(s);
        let (pitch, heading) = pitch_heading_of(&dir);
        let error = angle_between(&s.facing, &dir);

        if s.ut < self.node.ignition_ut() {
            event!("aligning: {:.1} s to ignition, error {:.2} deg", self.node.ignition_ut() - s.ut, error);
            return Ok(ControlCommand::steer(0.0, pitch, heading));
        }
        if error > self.config.alignment_tolerance {
            if !self.late_warned {
                warn!("ignition time reached but attitude is {:.1} deg off, holding", error);
                self.late_warned = true;
            }
            return Ok(ControlCommand::steer(0.0, pitch, heading));
        }

        info!(
            "ignition at ut {:.1}: {:.1} m/s planned over {:.1} s",
            s.ut,
            self.planned_delta_v(),
            self.node.burn_duration
        );
        self.phase = Phase::Burning;
        self.burn(s)
    }

    fn burn(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        let achieved = self.meter.update(s)?;
        let remaining = self.planned_delta_v() - achieved;
        if remaining <= self.config.cutoff_delta_v {
            info!(
                "cutoff: {:.2} of {:.2} m/s, ap {:.0} m, pe {:.0} m",
                achieved,
                self.planned_delta_v(),
                s.apoapsis,
                s.periapsis
            );
            self.phase = Phase::Done;
            return Ok(ControlCommand::release());
        }

        let (pitch, heading) = pitch_heading_of(&self.burn_direction(s));
        let throttle = tail_throttle(remaining, s.max_acceleration(), self.config.tail_time, self.config.min_throttle);
        event!("burning: {:.2} m/s left, throttle {:.2}", remaining, throttle);
        let cmd = ControlCommand::steer(throttle, pitch, heading);

        let spent = match self.stages.descriptor(s.stage) {
            Some(d) => d.is_spent(s.fuel_fraction()),
            None => s.fuel_fraction() <= 0.0,
        };
        if !spent {
            return Ok(cmd);
        }
        if self.stages.is_last(s.stage) {
            error!("stage {} empty with {:.1} m/s to go", s.stage, remaining);
            return Err(FlightError::InsufficientFuel { phase: Phase::Burning, stage: s.stage });
        }
        if self.stages.decouple(s.stage)? {
            info!("stage {} spent mid-burn, decoupling", s.stage);
            return Ok(cmd.with_stage());
        }
        Ok(cmd)
    }
}

impl Controller for ManeuverExecutor {
    fn control(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        match self.phase {
            Phase::Aligning => self.align(s),
            Phase::Burning => self.burn(s),
            _ => Ok(ControlCommand::release()),
        }
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    fn name(&self) -> &str {
        "maneuver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnc_mod::planner::NodeVector;
    use crate::vehicle::snapshot::tests::pad_snapshot;
    use crate::vehicle::{StageDescriptor, StageAction};
    use approx::assert_abs_diff_eq;

    fn orbiting() -> VehicleSnapshot {
        let mut s = pad_snapshot();
        s.altitude = 100_000.0;
        s.velocity = Vector3::new(2_246.0, 0.0, 0.0);
        s.speed = 2_246.0;
        s.facing = Vector3::z();
        s.mass = 5_000.0;
        s.fuel_amount = 3_500.0;
        s.fuel_capacity = 3_500.0;
        s.available_thrust = 100_000.0;
        s.specific_impulse = 345.0;
        s
    }

    fn node(prograde: f64) -> ManeuverNode {
        ManeuverNode {
            ut: 100.0,
            delta_v: NodeVector { prograde, normal: 0.0, radial: 0.0 },
            burn_duration: 20.0,
        }
    }

    fn executor(prograde: f64) -> ManeuverExecutor {
        ManeuverExecutor::new(
            node(prograde),
            ManeuverConfig::default(),
            StageSequence::in_flight(vec![StageDescriptor::liquid()], 0),
        )
    }

    #[test]
    fn aligns_prograde_before_ignition() {
        let mut ex = executor(800.0);
        let cmd = ex.control(&orbiting()).unwrap();
        assert_eq!(ex.phase(), Phase::Aligning);
        assert_eq!(cmd.throttle, 0.0);
        assert_abs_diff_eq!(cmd.pitch, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmd.heading, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn retrograde_node_points_backwards() {
        let mut ex = executor(-300.0);
        let cmd = ex.control(&orbiting()).unwrap();
        assert_abs_diff_eq!(cmd.heading, 270.0, epsilon = 1e-9);
    }

    fn executor_for(delta_v: NodeVector) -> ManeuverExecutor {
        ManeuverExecutor::new(
            ManeuverNode { ut: 100.0, delta_v, burn_duration: 20.0 },
            ManeuverConfig::default(),
            StageSequence::in_flight(vec![StageDescriptor::liquid()], 0),
        )
    }

    #[test]
    fn radial_out_node_points_away_from_the_body() {
        let mut ex = executor_for(NodeVector { prograde: 0.0, normal: 0.0, radial: 50.0 });
        let cmd = ex.control(&orbiting()).unwrap();
        assert_abs_diff_eq!(cmd.pitch, 90.0, epsilon = 1e-9);

        let mut ex = executor_for(NodeVector { prograde: 0.0, normal: 0.0, radial: -50.0 });
        let cmd = ex.control(&orbiting()).unwrap();
        assert_abs_diff_eq!(cmd.pitch, -90.0, epsilon = 1e-9);
    }

    #[test]
    fn normal_node_points_along_angular_momentum() {
        // Eastward equatorial orbit: orbit normal is north
        let mut ex = executor_for(NodeVector { prograde: 0.0, normal: 40.0, radial: 0.0 });
        let cmd = ex.control(&orbiting()).unwrap();
        assert_abs_diff_eq!(cmd.pitch, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmd.heading, 0.0, epsilon = 1e-9);

        let mut ex = executor_for(NodeVector { prograde: 0.0, normal: -40.0, radial: 0.0 });
        let cmd = ex.control(&orbiting()).unwrap();
        assert_abs_diff_eq!(cmd.heading, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn mixed_node_splits_between_components() {
        let mut ex = executor_for(NodeVector { prograde: 100.0, normal: 0.0, radial: 100.0 });
        let cmd = ex.control(&orbiting()).unwrap();
        assert_abs_diff_eq!(cmd.pitch, 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmd.heading, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ex.planned_delta_v(), 100.0 * 2f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn waits_for_alignment_past_ignition_time() {
        let mut ex = executor(800.0);
        let mut s = orbiting();
        s.ut = 95.0;
        let cmd = ex.control(&s).unwrap();
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(ex.phase(), Phase::Aligning);

        s.facing = Vector3::x();
        let cmd = ex.control(&s).unwrap();
        assert_eq!(ex.phase(), Phase::Burning);
        assert_eq!(cmd.throttle, 1.0);
    }

    #[test]
    fn burn_cuts_at_planned_delta_v() {
        let mut ex = executor(100.0);
        let mut s = orbiting();
        s.ut = 95.0;
        s.facing = Vector3::x();
        ex.control(&s).unwrap();

        // Mass for exactly 100 m/s at Isp 345
        let ve = 345.0 * crate::orbital::G0;
        s.mass = 5_000.0 / (100.0 / ve).exp();
        s.ut = 100.0;
        let cmd = ex.control(&s).unwrap();
        assert_eq!(ex.phase(), Phase::Done);
        assert_eq!(cmd.throttle, 0.0);
        assert!(!cmd.autopilot);
        assert_abs_diff_eq!(ex.achieved_delta_v(), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn burn_eases_off_near_cutoff_unless_tail_disabled() {
        // 5 m/s left at 20 m/s^2: the default 2 s tail asks for 1/8 throttle
        let run = |tail_time: f64| {
            let cfg = ManeuverConfig { tail_time, ..ManeuverConfig::default() };
            let mut ex = ManeuverExecutor::new(
                node(100.0),
                cfg,
                StageSequence::in_flight(vec![StageDescriptor::liquid()], 0),
            );
            let mut s = orbiting();
            s.ut = 95.0;
            s.facing = Vector3::x();
            ex.control(&s).unwrap();
            let ve = 345.0 * crate::orbital::G0;
            s.mass = 5_000.0 / (95.0 / ve).exp();
            s.available_thrust = 20.0 * s.mass;
            ex.control(&s).unwrap().throttle
        };
        assert_abs_diff_eq!(run(2.0), 0.125, epsilon = 1e-6);
        assert_eq!(run(0.0), 1.0);
    }

    #[test]
    fn empty_only_stage_is_insufficient_fuel() {
        let mut ex = executor(800.0);
        let mut s = orbiting();
        s.ut = 95.0;
        s.facing = Vector3::x();
        ex.control(&s).unwrap();
        s.fuel_amount = 0.0;
        s.mass -= 100.0;
        let err = ex.control(&s).unwrap_err();
        assert_eq!(err, FlightError::InsufficientFuel { phase: Phase::Burning, stage: 0 });
    }

    #[test]
    fn spent_stage_with_successor_is_decoupled() {
        let mut ex = ManeuverExecutor::new(
            node(800.0),
            ManeuverConfig::default(),
            StageSequence::in_flight(vec![StageDescriptor::liquid(), StageDescriptor::liquid()], 0),
        );
        let mut s = orbiting();
        s.ut = 95.0;
        s.facing = Vector3::x();
        ex.control(&s).unwrap();
        s.fuel_amount = 0.0;
        s.mass -= 100.0;
        let cmd = ex.control(&s).unwrap();
        assert_eq!(cmd.stage, StageAction::Activate);
    }
}
