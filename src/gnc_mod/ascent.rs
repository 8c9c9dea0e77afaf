use crate::config::AscentConfig;
use crate::error::{FlightError, Phase};
use crate::orbital::{burn_duration, vis_viva_speed};
use crate::vehicle::snapshot::{angle_between, compass, direction_from};
use crate::vehicle::{ControlCommand, StageSequence, VehicleSnapshot};

use super::controller::Controller;
use super::guidance::{
    apoapsis_throttle, apsis_speed, circularization_delta_v, gate_on_alignment, pitch_program,
    tail_throttle,
};

/// Apsis trims start only when the apsis is at least this far away (s),
/// leaving time to turn around.
const TRIM_MIN_LEAD: f64 = 30.0;
/// Attitude error allowed while a trim burn is running (deg).
const TRIM_ALIGNMENT: f64 = 5.0;

// ---------------------------------------------------------------------------
// Orbit target
// ---------------------------------------------------------------------------

/// Desired circular orbit: altitude above the mean radius and launch heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitTarget {
    pub altitude: f64, // m
    pub heading: f64,  // deg, compass (east = 90)
}

impl OrbitTarget {
    pub fn new(altitude: f64, heading: f64) -> Result<Self, FlightError> {
        if !(altitude.is_finite() && altitude > 0.0) {
            return Err(FlightError::non_physical(format!(
                "target altitude must be positive, got {altitude}"
            )));
        }
        if !heading.is_finite() {
            return Err(FlightError::non_physical("heading must be finite"));
        }
        Ok(Self { altitude, heading: compass(heading) })
    }
}

// ---------------------------------------------------------------------------
// Burn bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct BurnPlan {
    delta_v: f64,
    duration: f64,
}

/// Horizontal burn at one apsis that moves the opposite apsis onto the target.
#[derive(Debug, Clone, Copy)]
struct TrimBurn {
    prograde: bool,
    apsis_ut: f64,
    duration: f64,
    burning: bool,
}

// ---------------------------------------------------------------------------
// Ascent state machine
// ---------------------------------------------------------------------------

/// Launch-to-circular-orbit program.
///
/// PRELAUNCH -> VERTICAL_ASCENT -> GRAVITY_TURN -> COASTING_TO_APOAPSIS ->
/// CIRCULARIZING -> (TRIMMING_APSIDES ->) ORBIT_ACHIEVED
///
/// Decisions depend only on the snapshots fed in, so the same sequence of
/// snapshots always yields the same commands.
#[derive(Debug, Clone)]
pub struct AscentStateMachine {
    target: OrbitTarget,
    config: AscentConfig,
    stages: StageSequence,
    phase: Phase,
    pitch: f64, // lowest pitch commanded so far in the turn
    circularization: Option<BurnPlan>,
    trim: Option<TrimBurn>,
    trims: u32,
    stage_events: u32,
}

impl AscentStateMachine {
    pub fn new(target: OrbitTarget, config: AscentConfig, stages: StageSequence) -> Self {
        Self {
            target,
            config,
            stages,
            phase: Phase::Prelaunch,
            pitch: 90.0,
            circularization: None,
            trim: None,
            trims: 0,
            stage_events: 0,
        }
    }

    pub fn target(&self) -> &OrbitTarget {
        &self.target
    }

    /// Apsis trim burns completed.
    pub fn trims(&self) -> u32 {
        self.trims
    }

    /// Stage activations commanded, ignition included.
    pub fn stage_events(&self) -> u32 {
        self.stage_events
    }

    /// Planned circularization delta-v, once the coast has begun.
    pub fn circularization_delta_v(&self) -> Option<f64> {
        self.circularization.map(|p| p.delta_v)
    }

    fn turn_end(&self) -> f64 {
        self.config.turn_end_altitude.unwrap_or(self.target.altitude)
    }

    fn enter(&mut self, next: Phase) {
        info!("ascent: {} -> {}", self.phase, next);
        self.phase = next;
    }

    // -----------------------------------------------------------------------
    // Staging
    // -----------------------------------------------------------------------

    /// Adds a decouple to `cmd` when the active stage is spent. An empty
    /// last stage is fatal.
    fn stage_if_spent(&mut self, s: &VehicleSnapshot, cmd: ControlCommand) -> Result<ControlCommand, FlightError> {
        let fraction = s.fuel_fraction();
        let spent = match self.stages.descriptor(s.stage) {
            Some(d) => d.is_spent(fraction),
            None => fraction <= 0.0,
        };
        if !spent {
            return Ok(cmd);
        }
        if self.stages.is_last(s.stage) {
            error!("stage {} empty during {}", s.stage, self.phase);
            return Err(FlightError::InsufficientFuel { phase: self.phase, stage: s.stage });
        }
        if self.stages.decouple(s.stage)? {
            info!("stage {} spent at {:.0} m, decoupling", s.stage, s.altitude);
            self.stage_events += 1;
            return Ok(cmd.with_stage());
        }
        Ok(cmd)
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    fn launch(&mut self) -> ControlCommand {
        let mut cmd = ControlCommand::steer(1.0, 90.0, self.target.heading);
        if self.stages.ignite() {
            self.stage_events += 1;
            cmd = cmd.with_stage();
        }
        info!(
            "ignition: target {:.1} km, heading {:.1} deg",
            self.target.altitude / 1000.0,
            self.target.heading
        );
        self.enter(Phase::VerticalAscent);
        cmd
    }

    fn vertical_ascent(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        if s.altitude > self.config.turn_start_altitude || s.apoapsis >= self.target.altitude {
            self.enter(Phase::GravityTurn);
            return self.gravity_turn(s);
        }
        let cmd = ControlCommand::steer(1.0, 90.0, self.target.heading);
        self.stage_if_spent(s, cmd)
    }

    fn gravity_turn(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        if s.apoapsis >= self.target.altitude {
            let plan = self.plan_circularization(s)?;
            info!(
                "apoapsis {:.0} m reached, circularization {:.1} m/s over {:.1} s",
                s.apoapsis, plan.delta_v, plan.duration
            );
            self.circularization = Some(plan);
            self.enter(Phase::CoastingToApoapsis);
            return Ok(ControlCommand::steer(0.0, 0.0, s.prograde_heading(self.target.heading)));
        }

        let program = pitch_program(
            s.altitude,
            self.config.turn_start_altitude,
            self.turn_end(),
            self.config.pitch_profile,
        );
        self.pitch = self.pitch.min(program);
        let throttle = apoapsis_throttle(
            s.apoapsis,
            self.target.altitude,
            self.config.apoapsis_throttle_band,
            self.config.min_throttle,
        );
        event!("turn: alt {:.0} ap {:.0} pitch {:.1} thr {:.2}", s.altitude, s.apoapsis, self.pitch, throttle);
        let cmd = ControlCommand::steer(throttle, self.pitch, self.target.heading);
        self.stage_if_spent(s, cmd)
    }

    fn plan_circularization(&self, s: &VehicleSnapshot) -> Result<BurnPlan, FlightError> {
        let delta_v = circularization_delta_v(s.body.mu, s.body.radius, s.apoapsis, s.semi_major_axis)?.max(0.0);
        // The engine may already be shut down or staged out; plan with whatever is lit.
        let duration = if s.available_thrust > 0.0 {
            burn_duration(delta_v, s.available_thrust, s.mass, s.exhaust_velocity()?)?
        } else {
            0.0
        };
        Ok(BurnPlan { delta_v, duration })
    }

    fn coast(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        let plan = match self.circularization {
            Some(plan) => plan,
            None => {
                let plan = self.plan_circularization(s)?;
                self.circularization = Some(plan);
                plan
            }
        };
        let lead = plan.duration / 2.0 + self.config.circularization_lead;
        if s.time_to_apoapsis <= lead || s.vertical_speed < 0.0 {
            self.enter(Phase::Circularizing);
            return self.circularize(s);
        }
        Ok(ControlCommand::steer(0.0, 0.0, s.prograde_heading(self.target.heading)))
    }

    fn circularize(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        let v_circ = vis_viva_speed(s.body.mu, s.radius(), s.radius())?;
        let dv_h = v_circ - s.horizontal_speed();
        let dv_v = -s.vertical_speed;
        let remaining = dv_h.hypot(dv_v);
        let heading = s.prograde_heading(self.target.heading);

        if remaining <= self.config.cutoff_delta_v || dv_h < 0.0 {
            info!(
                "circularization cutoff: ap {:.0} m, pe {:.0} m, residual {:.2} m/s",
                s.apoapsis, s.periapsis, remaining
            );
            return self.after_burn(s);
        }

        let pitch = dv_v.atan2(dv_h).to_degrees();
        let error = angle_between(&s.facing, &direction_from(pitch, heading));
        let throttle = gate_on_alignment(
            tail_throttle(remaining, s.max_acceleration(), self.config.tail_time, self.config.min_throttle),
            error,
            self.config.max_steering_error,
        );
        event!("circ: remaining {:.2} m/s pitch {:.2} thr {:.2}", remaining, pitch, throttle);
        self.stage_if_spent(s, ControlCommand::steer(throttle, pitch, heading))
    }

    fn apsides_on_target(&self, s: &VehicleSnapshot) -> bool {
        let tol = self.config.orbit_tolerance;
        (s.apoapsis - self.target.altitude).abs() <= tol && (s.periapsis - self.target.altitude).abs() <= tol
    }

    fn after_burn(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        if !self.config.correct_apsides || self.apsides_on_target(s) {
            return Ok(self.achieve(s));
        }
        self.enter(Phase::TrimmingApsides);
        self.trim = None;
        self.trim_apsides(s)
    }

    fn achieve(&mut self, s: &VehicleSnapshot) -> ControlCommand {
        info!(
            "orbit achieved: ap {:.0} m, pe {:.0} m, e {:.5}, {} trim(s)",
            s.apoapsis, s.periapsis, s.eccentricity, self.trims
        );
        self.enter(Phase::OrbitAchieved);
        ControlCommand::release()
    }

    // -----------------------------------------------------------------------
    // Apsis trims
    // -----------------------------------------------------------------------

    fn trim_apsides(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        let mut trim = match self.trim {
            Some(trim) => trim,
            None => {
                if self.apsides_on_target(s) {
                    return Ok(self.achieve(s));
                }
                if self.trims >= self.config.max_trims {
                    warn!(
                        "apsides still off target after {} trims (ap {:.0} m, pe {:.0} m)",
                        self.trims, s.apoapsis, s.periapsis
                    );
                    return Ok(self.achieve(s));
                }
                match self.plan_trim(s)? {
                    Some(trim) => trim,
                    None => return Ok(self.achieve(s)),
                }
            }
        };

        let prograde_heading = s.prograde_heading(self.target.heading);
        let heading = if trim.prograde { prograde_heading } else { prograde_heading + 180.0 };

        if !trim.burning {
            if s.ut < trim.apsis_ut - trim.duration / 2.0 {
                self.trim = Some(trim);
                return Ok(ControlCommand::steer(0.0, 0.0, heading));
            }
            info!("trim {} ignition, {}", self.trims + 1, if trim.prograde { "prograde" } else { "retrograde" });
            trim.burning = true;
        }

        let target_radius = s.body.radius + self.target.altitude;
        let goal = apsis_speed(s.body.mu, s.radius(), target_radius)?;
        let v_h = s.horizontal_speed();
        let remaining = if trim.prograde { goal - v_h } else { v_h - goal };
        if remaining <= self.config.cutoff_delta_v {
            self.trims += 1;
            self.trim = None;
            info!("trim {} done: ap {:.0} m, pe {:.0} m", self.trims, s.apoapsis, s.periapsis);
            return Ok(ControlCommand::steer(0.0, 0.0, heading));
        }

        self.trim = Some(trim);
        let error = angle_between(&s.facing, &direction_from(0.0, heading));
        let throttle = gate_on_alignment(
            tail_throttle(remaining, s.max_acceleration(), self.config.tail_time, self.config.min_throttle),
            error,
            TRIM_ALIGNMENT,
        );
        self.stage_if_spent(s, ControlCommand::steer(throttle, 0.0, heading))
    }

    /// Burn at the apsis opposite the larger error. `None` when the needed
    /// delta-v is already below the cutoff.
    fn plan_trim(&self, s: &VehicleSnapshot) -> Result<Option<TrimBurn>, FlightError> {
        let mu = s.body.mu;
        let target_radius = s.body.radius + self.target.altitude;
        let ap_error = (s.apoapsis - self.target.altitude).abs();
        let pe_error = (s.periapsis - self.target.altitude).abs();

        // burning at apoapsis moves the periapsis and vice versa
        let at_apoapsis = pe_error >= ap_error;
        let (altitude, time_to) = if at_apoapsis {
            (s.apoapsis, s.time_to_apoapsis)
        } else {
            (s.periapsis, s.time_to_periapsis)
        };
        let r = s.body.radius + altitude;
        let delta_v = apsis_speed(mu, r, target_radius)? - vis_viva_speed(mu, r, s.semi_major_axis)?;
        if delta_v.abs() <= self.config.cutoff_delta_v {
            return Ok(None);
        }

        let duration = if s.available_thrust > 0.0 {
            burn_duration(delta_v.abs(), s.available_thrust, s.mass, s.exhaust_velocity()?)?
        } else if self.stages.is_last(s.stage) {
            error!("stage {} has no thrust left for a {:+.2} m/s trim", s.stage, delta_v);
            return Err(FlightError::InsufficientFuel { phase: Phase::TrimmingApsides, stage: s.stage });
        } else {
            // the spent stage is dropped on the first burn tick
            0.0
        };
        let mut wait = time_to;
        if wait < duration / 2.0 + TRIM_MIN_LEAD {
            wait += s.period;
        }
        info!(
            "planning trim at {}: {:+.2} m/s in {:.0} s",
            if at_apoapsis { "apoapsis" } else { "periapsis" },
            delta_v,
            wait
        );
        Ok(Some(TrimBurn {
            prograde: delta_v > 0.0,
            apsis_ut: s.ut + wait,
            duration,
            burning: false,
        }))
    }
}

impl Controller for AscentStateMachine {
    fn control(&mut self, s: &VehicleSnapshot) -> Result<ControlCommand, FlightError> {
        match self.phase {
            Phase::Prelaunch => Ok(self.launch()),
            Phase::VerticalAscent => self.vertical_ascent(s),
            Phase::GravityTurn => self.gravity_turn(s),
            Phase::CoastingToApoapsis => self.coast(s),
            Phase::Circularizing => self.circularize(s),
            Phase::TrimmingApsides => self.trim_apsides(s),
            Phase::OrbitAchieved | Phase::Aligning | Phase::Burning | Phase::Done => {
                Ok(ControlCommand::release())
            }
        }
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn is_done(&self) -> bool {
        self.phase == Phase::OrbitAchieved
    }

    fn name(&self) -> &str {
        "ascent"
    }
}
