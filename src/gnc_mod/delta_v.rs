use crate::error::FlightError;
use crate::orbital::{rocket_delta_v, G0};
use crate::vehicle::VehicleSnapshot;

// ---------------------------------------------------------------------------
// Achieved delta-v from propellant consumption
// ---------------------------------------------------------------------------

/// Integrates the rocket equation over the mass drop between consecutive
/// snapshots. Mass changes across a stage change are jettisoned hardware and
/// are not counted.
#[derive(Debug, Clone, Default)]
pub struct DeltaVMeter {
    last: Option<Sample>,
    total: f64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    stage: usize,
    mass: f64,
    isp: f64,
}

impl DeltaVMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta-v accumulated so far (m/s).
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Feed the next snapshot; returns the updated total.
    pub fn update(&mut self, snapshot: &VehicleSnapshot) -> Result<f64, FlightError> {
        if let Some(prev) = self.last {
            if prev.stage == snapshot.stage && snapshot.mass < prev.mass && prev.isp > 0.0 {
                self.total += rocket_delta_v(prev.isp * G0, prev.mass, snapshot.mass)?;
            }
        }
        self.last = Some(Sample {
            stage: snapshot.stage,
            mass: snapshot.mass,
            isp: snapshot.specific_impulse,
        });
        Ok(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::snapshot::tests::pad_snapshot;
    use approx::assert_relative_eq;

    #[test]
    fn first_sample_is_baseline() {
        let mut meter = DeltaVMeter::new();
        assert_eq!(meter.update(&pad_snapshot()).unwrap(), 0.0);
    }

    #[test]
    fn accumulates_rocket_equation() {
        let mut meter = DeltaVMeter::new();
        let mut s = pad_snapshot();
        s.specific_impulse = 320.0;
        s.mass = 8_000.0;
        meter.update(&s).unwrap();
        s.mass = 6_000.0;
        meter.update(&s).unwrap();
        s.mass = 4_000.0;
        let total = meter.update(&s).unwrap();
        assert_relative_eq!(total, 320.0 * G0 * 2.0_f64.ln(), max_relative = 1e-9);
    }

    #[test]
    fn staging_mass_drop_is_ignored() {
        let mut meter = DeltaVMeter::new();
        let mut s = pad_snapshot();
        meter.update(&s).unwrap();
        s.stage = 1;
        s.mass -= 1_500.0;
        assert_eq!(meter.update(&s).unwrap(), 0.0);
    }

    #[test]
    fn coasting_adds_nothing() {
        let mut meter = DeltaVMeter::new();
        let s = pad_snapshot();
        meter.update(&s).unwrap();
        meter.update(&s).unwrap();
        assert_eq!(meter.total(), 0.0);
    }
}
