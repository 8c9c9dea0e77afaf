use crate::orbital::G0;
use crate::vehicle::FuelType;

// ---------------------------------------------------------------------------
// Simulated stage hardware
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimStage {
    pub name: String,
    pub fuel: FuelType,
    pub dry_mass: f64,        // kg
    pub propellant_mass: f64, // kg
    pub thrust: f64,          // N, vacuum
    pub isp: f64,             // s, vacuum
}

impl SimStage {
    pub fn mass_flow(&self) -> f64 {
        self.thrust / (self.isp * G0)
    }

    pub fn total_mass(&self) -> f64 {
        self.dry_mass + self.propellant_mass
    }

    /// Full-thrust burn time.
    pub fn burn_time(&self) -> f64 {
        if self.thrust > 0.0 {
            self.propellant_mass / self.mass_flow()
        } else {
            0.0
        }
    }

    pub fn delta_v(&self, payload_mass: f64) -> f64 {
        let m0 = self.total_mass() + payload_mass;
        let mf = self.dry_mass + payload_mass;
        self.isp * G0 * (m0 / mf).ln()
    }
}

pub struct SimStageBuilder {
    name: String,
    fuel: FuelType,
    dry_mass: f64,
    propellant_mass: f64,
    thrust: f64,
    isp: f64,
}

impl SimStageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fuel: FuelType::Liquid,
            dry_mass: 1_000.0,
            propellant_mass: 4_000.0,
            thrust: 60_000.0,
            isp: 320.0,
        }
    }

    pub fn fuel(mut self, v: FuelType) -> Self { self.fuel = v; self }
    pub fn dry_mass(mut self, v: f64) -> Self { self.dry_mass = v; self }
    pub fn propellant_mass(mut self, v: f64) -> Self { self.propellant_mass = v; self }
    pub fn thrust(mut self, v: f64) -> Self { self.thrust = v; self }
    pub fn isp(mut self, v: f64) -> Self { self.isp = v; self }

    pub fn build(self) -> SimStage {
        SimStage {
            name: self.name,
            fuel: self.fuel,
            dry_mass: self.dry_mass,
            propellant_mass: self.propellant_mass,
            thrust: self.thrust,
            isp: self.isp,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulated vehicle: ordered stack, bottom stage first
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub name: String,
    pub stages: Vec<SimStage>,
    /// Stages jettisoned before the simulation starts; offsets the reported
    /// stage index so it matches the full stack's numbering.
    pub dropped_stages: usize,
}

impl SimVehicle {
    pub fn total_mass(&self) -> f64 {
        self.stages.iter().map(|s| s.total_mass()).sum()
    }

    /// Ideal delta-v, each stage carrying the ones above it as payload.
    pub fn total_delta_v(&self) -> f64 {
        let mut dv = 0.0;
        for i in 0..self.stages.len() {
            let payload: f64 = self.stages[i + 1..].iter().map(|s| s.total_mass()).sum();
            dv += self.stages[i].delta_v(payload);
        }
        dv
    }
}

pub mod presets {
    use super::*;

    /// Solid booster under a liquid upper stage; enough for low Kerbin orbit
    /// with margin in vacuum.
    pub fn two_stage_orbiter() -> SimVehicle {
        SimVehicle {
            name: "Orbiter".into(),
            stages: vec![
                SimStageBuilder::new("S1-Booster")
                    .fuel(FuelType::Solid)
                    .dry_mass(1_500.0)
                    .propellant_mass(6_000.0)
                    .thrust(300_000.0)
                    .isp(250.0)
                    .build(),
                SimStageBuilder::new("S2-Upper")
                    .fuel(FuelType::Liquid)
                    .dry_mass(2_000.0)
                    .propellant_mass(6_000.0)
                    .thrust(120_000.0)
                    .isp(320.0)
                    .build(),
            ],
            dropped_stages: 0,
        }
    }

    /// Same stack with tanks too small to reach orbital speed; the upper
    /// stage runs dry before the apoapsis reaches low orbit.
    pub fn underfuelled_orbiter() -> SimVehicle {
        let mut v = two_stage_orbiter();
        v.name = "Orbiter (short tanks)".into();
        v.stages[0].propellant_mass = 1_500.0;
        v.stages[1].propellant_mass = 300.0;
        v
    }

    /// Upper stage already in orbit, booster long gone.
    pub fn transfer_stage() -> SimVehicle {
        SimVehicle {
            name: "Transfer stage".into(),
            stages: vec![SimStageBuilder::new("S2-Transfer")
                .fuel(FuelType::Liquid)
                .dry_mass(1_500.0)
                .propellant_mass(3_500.0)
                .thrust(100_000.0)
                .isp(345.0)
                .build()],
            dropped_stages: 1,
        }
    }
}
