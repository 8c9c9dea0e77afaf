use std::collections::VecDeque;

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::error::LinkError;
use crate::link::{FlightTelemetry, OrbitTelemetry, PropulsionTelemetry, Vessel};
use crate::orbital::{CelestialBody, KeplerianElements};
use crate::vehicle::snapshot::direction_from;
use crate::vehicle::{ControlCommand, FuelType};

use super::integrator::{rk4_step, PointMass, Propulsion};
use super::vehicle::SimVehicle;

/// Integration substep (s).
const SUBSTEP: f64 = 0.02;
/// Default attitude slew rate (deg/s).
const SLEW_RATE: f64 = 15.0;

// ---------------------------------------------------------------------------
// Simulated vessel
// ---------------------------------------------------------------------------

/// In-process stand-in for a remote vessel: point mass around a
/// non-rotating, airless body.
///
/// Solid stages burn at full thrust once lit. Liquid stages follow the
/// throttle. Attitude slews toward the commanded pitch/heading at a fixed
/// rate; with the autopilot released the vehicle keeps its inertial attitude.
#[derive(Debug, Clone)]
pub struct SimulatedVessel {
    vehicle: SimVehicle,
    body: CelestialBody,
    state: PointMass,
    propellant: Vec<f64>, // kg left per stage
    active: usize,        // index into vehicle.stages
    ignited: bool,
    throttle: f64,
    attitude_target: Option<(f64, f64)>, // (pitch, heading) deg
    facing: Vector3<f64>,                // inertial unit vector
    landed: bool,
    destroyed: bool,
    slew_rate: f64,
    faults: VecDeque<LinkError>,
}

impl SimulatedVessel {
    /// Vehicle standing on the equator, engines cold.
    pub fn on_pad(vehicle: SimVehicle, body: CelestialBody) -> Self {
        let pos = Vector3::new(body.radius, 0.0, 0.0);
        let state = PointMass { time: 0.0, pos, vel: Vector3::zeros(), mass: vehicle.total_mass() };
        Self::build(vehicle, body, state, pos.normalize(), false, true)
    }

    /// Vehicle coasting on the given orbit with its first stage lit and
    /// the throttle closed, pointing prograde.
    pub fn in_orbit(vehicle: SimVehicle, body: CelestialBody, orbit: &KeplerianElements) -> Self {
        let (pos, vel) = orbit.to_state_vector(body.mu);
        let state = PointMass { time: 0.0, pos, vel, mass: vehicle.total_mass() };
        let facing = if vel.norm() > 0.0 { vel.normalize() } else { pos.normalize() };
        Self::build(vehicle, body, state, facing, true, false)
    }

    fn build(
        vehicle: SimVehicle,
        body: CelestialBody,
        state: PointMass,
        facing: Vector3<f64>,
        ignited: bool,
        landed: bool,
    ) -> Self {
        let propellant = vehicle.stages.iter().map(|s| s.propellant_mass).collect();
        Self {
            vehicle,
            body,
            state,
            propellant,
            active: 0,
            ignited,
            throttle: 0.0,
            attitude_target: None,
            facing,
            landed,
            destroyed: false,
            slew_rate: SLEW_RATE,
            faults: VecDeque::new(),
        }
    }

    pub fn with_slew_rate(mut self, deg_per_s: f64) -> Self {
        self.slew_rate = deg_per_s;
        self
    }

    /// Queue link failures; each remote call consumes one until empty.
    pub fn inject_faults(&mut self, faults: impl IntoIterator<Item = LinkError>) {
        self.faults.extend(faults);
    }

    pub fn name(&self) -> &str {
        &self.vehicle.name
    }

    pub fn altitude(&self) -> f64 {
        self.state.pos.norm() - self.body.radius
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn elements(&self) -> KeplerianElements {
        KeplerianElements::from_state_vector(&self.state.pos, &self.state.vel, self.body.mu)
    }

    // -----------------------------------------------------------------------
    // Local frame: x = east, y = north, z = up
    // -----------------------------------------------------------------------

    fn local_axes(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let up = self.state.pos.normalize();
        let east = Vector3::z().cross(&up);
        let east = if east.norm() > 1e-9 { east.normalize() } else { Vector3::y() };
        let north = up.cross(&east);
        (east, north, up)
    }

    fn to_local(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let (e, n, u) = self.local_axes();
        Vector3::new(v.dot(&e), v.dot(&n), v.dot(&u))
    }

    fn from_local(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let (e, n, u) = self.local_axes();
        e * v.x + n * v.y + u * v.z
    }

    // -----------------------------------------------------------------------
    // Physics
    // -----------------------------------------------------------------------

    /// Every remote call goes through here.
    fn remote_call(&mut self) -> Result<(), LinkError> {
        if let Some(fault) = self.faults.pop_front() {
            return Err(fault);
        }
        if self.destroyed {
            return Err(LinkError::Dropped(format!("{} was destroyed", self.vehicle.name)));
        }
        Ok(())
    }

    fn activate_stage(&mut self) {
        if !self.ignited {
            self.ignited = true;
            info!("[sim] {}: stage {} ignition", self.vehicle.name, self.reported_stage());
            return;
        }
        if self.active + 1 >= self.vehicle.stages.len() {
            warn!("[sim] {}: no stage left to activate", self.vehicle.name);
            return;
        }
        let dropped = &self.vehicle.stages[self.active];
        self.state.mass -= dropped.dry_mass + self.propellant[self.active];
        self.propellant[self.active] = 0.0;
        self.active += 1;
        info!(
            "[sim] {}: separated {}, {:.0} kg left",
            self.vehicle.name, dropped.name, self.state.mass
        );
    }

    fn reported_stage(&self) -> usize {
        self.vehicle.dropped_stages + self.active
    }

    fn slew(&mut self, dt: f64) {
        let Some((pitch, heading)) = self.attitude_target else {
            return;
        };
        let target = self.from_local(&direction_from(pitch, heading));
        let angle = self.facing.dot(&target).clamp(-1.0, 1.0).acos();
        let max_step = (self.slew_rate * dt).to_radians();
        if angle <= max_step {
            self.facing = target;
            return;
        }
        let axis = self.facing.cross(&target);
        let axis = if axis.norm() > 1e-12 {
            axis
        } else {
            // opposite directions: turn through any perpendicular
            self.facing.cross(&self.state.pos).try_normalize(1e-12).unwrap_or_else(Vector3::z)
        };
        let rot = UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), max_step);
        self.facing = (rot * self.facing).normalize();
    }

    /// Thrust and mass flow for one substep, limited by remaining propellant.
    fn thrust_for(&self, dt: f64) -> Propulsion {
        let stage = &self.vehicle.stages[self.active];
        let left = self.propellant[self.active];
        if !self.ignited || left <= 0.0 {
            return Propulsion::off();
        }
        let throttle = match stage.fuel {
            FuelType::Solid => 1.0,
            FuelType::Liquid => self.throttle,
        };
        if throttle <= 0.0 {
            return Propulsion::off();
        }
        let mut mass_flow = stage.mass_flow() * throttle;
        let mut thrust = stage.thrust * throttle;
        let needed = mass_flow * dt;
        if needed > left {
            let k = left / needed;
            mass_flow *= k;
            thrust *= k;
        }
        Propulsion { thrust: self.facing * thrust, mass_flow }
    }

    fn substep(&mut self, dt: f64) {
        self.slew(dt);
        let prop = self.thrust_for(dt);

        if self.landed {
            let up = self.state.pos.normalize();
            let weight = self.body.surface_gravity() * self.state.mass;
            if prop.thrust.dot(&up) <= weight {
                // held by the pad
                self.state.time += dt;
                self.state.mass -= prop.mass_flow * dt;
                self.consume(prop.mass_flow * dt);
                return;
            }
            self.landed = false;
            info!("[sim] {}: liftoff at t={:.1}", self.vehicle.name, self.state.time);
        }

        self.state = rk4_step(&self.state, self.body.mu, &prop, dt);
        self.consume(prop.mass_flow * dt);

        if self.altitude() < 0.0 {
            self.destroyed = true;
            error!("[sim] {}: impact at t={:.1}", self.vehicle.name, self.state.time);
        }
    }

    fn consume(&mut self, burned: f64) {
        let left = &mut self.propellant[self.active];
        *left -= burned;
        if *left < 1e-9 {
            *left = 0.0;
        }
    }
}

// ---------------------------------------------------------------------------
// Remote interface
// ---------------------------------------------------------------------------

impl Vessel for SimulatedVessel {
    fn ut(&mut self) -> Result<f64, LinkError> {
        self.remote_call()?;
        Ok(self.state.time)
    }

    fn flight(&mut self) -> Result<FlightTelemetry, LinkError> {
        self.remote_call()?;
        Ok(FlightTelemetry {
            altitude: self.altitude(),
            velocity: self.to_local(&self.state.vel),
            facing: self.to_local(&self.facing),
        })
    }

    fn orbit(&mut self) -> Result<OrbitTelemetry, LinkError> {
        self.remote_call()?;
        let el = self.elements();
        let mu = self.body.mu;
        Ok(OrbitTelemetry {
            apoapsis: el.apoapsis_radius() - self.body.radius,
            periapsis: el.periapsis_radius() - self.body.radius,
            semi_major_axis: el.sma,
            eccentricity: el.ecc,
            time_to_apoapsis: el.time_to_apoapsis(mu),
            time_to_periapsis: el.time_to_periapsis(mu),
            period: el.period(mu),
        })
    }

    fn propulsion(&mut self) -> Result<PropulsionTelemetry, LinkError> {
        self.remote_call()?;
        let stage = &self.vehicle.stages[self.active];
        let left = self.propellant[self.active];
        Ok(PropulsionTelemetry {
            mass: self.state.mass,
            available_thrust: if self.ignited && left > 0.0 { stage.thrust } else { 0.0 },
            specific_impulse: stage.isp,
            stage: self.reported_stage(),
            fuel_amount: left,
            fuel_capacity: stage.propellant_mass,
        })
    }

    fn body(&mut self) -> Result<CelestialBody, LinkError> {
        self.remote_call()?;
        Ok(self.body.clone())
    }

    fn apply(&mut self, command: &ControlCommand) -> Result<(), LinkError> {
        self.remote_call()?;
        self.throttle = command.throttle.clamp(0.0, 1.0);
        self.attitude_target = command.autopilot.then_some((command.pitch, command.heading));
        if command.stages() {
            self.activate_stage();
        }
        Ok(())
    }

    fn await_tick(&mut self, period: f64) -> Result<(), LinkError> {
        self.remote_call()?;
        if !(period > 0.0) {
            return Ok(());
        }
        let steps = (period / SUBSTEP).ceil().max(1.0) as usize;
        let dt = period / steps as f64;
        for _ in 0..steps {
            if self.destroyed {
                break;
            }
            self.substep(dt);
        }
        Ok(())
    }
}
