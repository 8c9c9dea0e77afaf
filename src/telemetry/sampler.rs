use std::thread;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{FlightError, LinkError};
use crate::link::Vessel;
use crate::vehicle::{ControlCommand, VehicleSnapshot};

// ---------------------------------------------------------------------------
// Retry policy for transient link failures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total tries per remote call, the first one included.
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 50,
            max_backoff_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (0-based): base * 2^retry, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.min(32)).unwrap_or(u64::MAX);
        let ms = self.base_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

// ---------------------------------------------------------------------------
// Telemetry sampler
// ---------------------------------------------------------------------------

/// Reads a fresh [`VehicleSnapshot`] per tick and pushes commands, retrying
/// timeouts with exponential backoff. Nothing is cached between ticks.
#[derive(Debug, Clone)]
pub struct TelemetrySampler {
    policy: RetryPolicy,
    retries: u32, // total retries performed, for reporting
}

impl TelemetrySampler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, retries: 0 }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Take one consistent snapshot: every field is re-read on each attempt.
    pub fn sample<V: Vessel + ?Sized>(&mut self, vessel: &mut V) -> Result<VehicleSnapshot, FlightError> {
        self.with_retry("telemetry", || read_snapshot(vessel))
    }

    /// Send one command set, with the same retry policy as sampling.
    pub fn send<V: Vessel + ?Sized>(&mut self, vessel: &mut V, command: &ControlCommand) -> Result<(), FlightError> {
        self.with_retry("command", || vessel.apply(command))
    }

    /// Block until the next control tick.
    pub fn wait<V: Vessel + ?Sized>(&mut self, vessel: &mut V, period: f64) -> Result<(), FlightError> {
        self.with_retry("tick", || vessel.await_tick(period))
    }

    fn with_retry<T>(
        &mut self,
        what: &str,
        mut op: impl FnMut() -> Result<T, LinkError>,
    ) -> Result<T, FlightError> {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 0..attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    if attempt + 1 == attempts {
                        break;
                    }
                    let wait = self.policy.backoff(attempt);
                    warn!(
                        "{} {} (attempt {}/{}), retrying in {} ms",
                        what,
                        err,
                        attempt + 1,
                        attempts,
                        wait.as_millis()
                    );
                    self.retries += 1;
                    thread::sleep(wait);
                }
                Err(err) => {
                    error!("{} failed: {}", what, err);
                    return Err(err.into());
                }
            }
        }
        error!("{} retry budget exhausted after {} attempts", what, attempts);
        Err(LinkError::RetryBudgetExhausted { attempts }.into())
    }
}

fn read_snapshot<V: Vessel + ?Sized>(vessel: &mut V) -> Result<VehicleSnapshot, LinkError> {
    let ut = vessel.ut()?;
    let flight = vessel.flight()?;
    let orbit = vessel.orbit()?;
    let prop = vessel.propulsion()?;
    let body = vessel.body()?;

    Ok(VehicleSnapshot {
        ut,
        altitude: flight.altitude,
        speed: flight.velocity.norm(),
        vertical_speed: flight.velocity.z,
        velocity: flight.velocity,
        facing: flight.facing,
        apoapsis: orbit.apoapsis,
        periapsis: orbit.periapsis,
        semi_major_axis: orbit.semi_major_axis,
        eccentricity: orbit.eccentricity,
        time_to_apoapsis: orbit.time_to_apoapsis,
        time_to_periapsis: orbit.time_to_periapsis,
        period: orbit.period,
        stage: prop.stage,
        fuel_amount: prop.fuel_amount,
        fuel_capacity: prop.fuel_capacity,
        available_thrust: prop.available_thrust,
        specific_impulse: prop.specific_impulse,
        mass: prop.mass,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbital::body::presets::kerbin;
    use crate::sim::{presets, SimulatedVessel};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, base_backoff_ms: 1, max_backoff_ms: 4 }
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let p = RetryPolicy { max_attempts: 10, base_backoff_ms: 50, max_backoff_ms: 300 };
        assert_eq!(p.backoff(0), Duration::from_millis(50));
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(200));
        assert_eq!(p.backoff(3), Duration::from_millis(300));
        assert_eq!(p.backoff(40), Duration::from_millis(300));
    }

    #[test]
    fn sample_reads_pad_state() {
        let mut vessel = SimulatedVessel::on_pad(presets::two_stage_orbiter(), kerbin());
        let mut sampler = TelemetrySampler::new(fast_policy(3));
        let snap = sampler.sample(&mut vessel).unwrap();
        assert_eq!(snap.stage, 0);
        assert!(snap.altitude.abs() < 1.0);
        assert_eq!(snap.fuel_fraction(), 1.0);
        assert_eq!(snap.body.name, "Kerbin");
    }

    #[test]
    fn transient_timeouts_are_retried() {
        let mut vessel = SimulatedVessel::on_pad(presets::two_stage_orbiter(), kerbin());
        vessel.inject_faults([LinkError::Timeout, LinkError::Timeout]);
        let mut sampler = TelemetrySampler::new(fast_policy(3));
        assert!(sampler.sample(&mut vessel).is_ok());
        assert_eq!(sampler.retries(), 2);
    }

    #[test]
    fn exhausted_budget_becomes_connection_error() {
        let mut vessel = SimulatedVessel::on_pad(presets::two_stage_orbiter(), kerbin());
        vessel.inject_faults(std::iter::repeat(LinkError::Timeout).take(10));
        let mut sampler = TelemetrySampler::new(fast_policy(3));
        let err = sampler.sample(&mut vessel).unwrap_err();
        assert_eq!(err, FlightError::Connection(LinkError::RetryBudgetExhausted { attempts: 3 }));
    }

    #[test]
    fn dropped_link_fails_immediately() {
        let mut vessel = SimulatedVessel::on_pad(presets::two_stage_orbiter(), kerbin());
        vessel.inject_faults([LinkError::Dropped("eof".into())]);
        let mut sampler = TelemetrySampler::new(fast_policy(5));
        let err = sampler.sample(&mut vessel).unwrap_err();
        assert!(matches!(err, FlightError::Connection(LinkError::Dropped(_))));
        assert_eq!(sampler.retries(), 0);
    }

    #[test]
    fn commands_use_the_same_policy() {
        let mut vessel = SimulatedVessel::on_pad(presets::two_stage_orbiter(), kerbin());
        vessel.inject_faults([LinkError::Timeout]);
        let mut sampler = TelemetrySampler::new(fast_policy(2));
        sampler.send(&mut vessel, &ControlCommand::release()).unwrap();
        assert_eq!(sampler.retries(), 1);
    }
}
