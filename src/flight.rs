//! Blocking entry points: one synchronous control loop per run.
//!
//! Each tick samples the vessel, asks the active program for a command,
//! sends it as one unit and then waits for the next tick. Runs never share
//! mutable state; the connection is only read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::FlightConfig;
use crate::error::FlightError;
use crate::gnc::{plan_transfer, AscentStateMachine, Controller, ManeuverExecutor, ManeuverNode, OrbitTarget};
use crate::link::{Connection, Vessel};
use crate::telemetry::TelemetrySampler;
use crate::vehicle::{StageSequence, VehicleSnapshot};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Caller-side abort switch, checked between ticks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AscentReport {
    pub apoapsis: f64,    // m, altitude
    pub periapsis: f64,   // m, altitude
    pub final_pitch: f64, // deg, flight path angle at the end of the run
    pub stages_fired: u32,
    pub trims: u32,
    pub ut: f64,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    pub node_ut: f64,
    pub planned_delta_v: f64,  // m/s
    pub achieved_delta_v: f64, // m/s
    pub apoapsis: f64,         // m, altitude
    pub periapsis: f64,        // m, altitude
    pub ut: f64,
    pub retries: u32,
}

// ---------------------------------------------------------------------------
// Control loop
// ---------------------------------------------------------------------------

/// Drive `program` until it reports done. Returns a snapshot taken after
/// the final command went out.
fn fly<V: Vessel + ?Sized>(
    program: &mut dyn Controller,
    vessel: &mut V,
    sampler: &mut TelemetrySampler,
    tick: f64,
    cancel: &CancelToken,
) -> Result<VehicleSnapshot, FlightError> {
    let mut ticks: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            warn!("{}: cancelled during {} after {} ticks", program.name(), program.phase(), ticks);
            return Err(FlightError::Aborted { phase: program.phase() });
        }
        let snapshot = sampler.sample(vessel)?;
        let command = program.control(&snapshot)?;
        sampler.send(vessel, &command)?;
        if program.is_done() {
            info!("{}: finished in {} ticks at ut {:.1}", program.name(), ticks, snapshot.ut);
            return sampler.sample(vessel);
        }
        sampler.wait(vessel, tick)?;
        ticks += 1;
    }
}

// ---------------------------------------------------------------------------
// Launch to orbit
// ---------------------------------------------------------------------------

/// Fly from the pad to a circular orbit at `target_altitude` (m) with the
/// default configuration.
pub fn launch_to_orbit<C, V>(
    connection: &C,
    vessel: &mut V,
    heading: f64,
    target_altitude: f64,
) -> Result<AscentReport, FlightError>
where
    C: Connection + ?Sized,
    V: Vessel + ?Sized,
{
    launch_to_orbit_with(
        connection,
        vessel,
        heading,
        target_altitude,
        &FlightConfig::default(),
        &CancelToken::new(),
    )
}

pub fn launch_to_orbit_with<C, V>(
    connection: &C,
    vessel: &mut V,
    heading: f64,
    target_altitude: f64,
    config: &FlightConfig,
    cancel: &CancelToken,
) -> Result<AscentReport, FlightError>
where
    C: Connection + ?Sized,
    V: Vessel + ?Sized,
{
    config.validate()?;
    let target = OrbitTarget::new(target_altitude, heading)?;
    let mut sampler = TelemetrySampler::new(config.control.retry);

    let start = sampler.sample(vessel)?;
    let body = connection
        .body(&start.body.name)?
        .ok_or_else(|| FlightError::UnknownBody(start.body.name.clone()))?;
    info!(
        "launch from {}: target {:.0} m, heading {:.1} deg, {} stages",
        body.name,
        target.altitude,
        target.heading,
        config.stages.len()
    );

    let mut ascent = AscentStateMachine::new(target, config.ascent.clone(), StageSequence::new(config.stages.clone()));
    let end = fly(&mut ascent, vessel, &mut sampler, config.control.tick, cancel)?;

    let report = AscentReport {
        apoapsis: end.apoapsis,
        periapsis: end.periapsis,
        final_pitch: end.flight_path_angle(),
        stages_fired: ascent.stage_events(),
        trims: ascent.trims(),
        ut: end.ut,
        retries: sampler.retries(),
    };
    info!(
        "orbit achieved at ut {:.1}: ap {:.0} m, pe {:.0} m, {} trims",
        report.ut, report.apoapsis, report.periapsis, report.trims
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Transfer to another body
// ---------------------------------------------------------------------------

/// Plan and fly the departure burn toward `target_body` with the default
/// configuration. The arrival burn is left to the caller.
pub fn transfer_to_body<C, V>(connection: &C, vessel: &mut V, target_body: &str) -> Result<TransferReport, FlightError>
where
    C: Connection + ?Sized,
    V: Vessel + ?Sized,
{
    transfer_to_body_with(connection, vessel, target_body, &FlightConfig::default(), &CancelToken::new())
}

pub fn transfer_to_body_with<C, V>(
    connection: &C,
    vessel: &mut V,
    target_body: &str,
    config: &FlightConfig,
    cancel: &CancelToken,
) -> Result<TransferReport, FlightError>
where
    C: Connection + ?Sized,
    V: Vessel + ?Sized,
{
    config.validate()?;
    let target = connection
        .body(target_body)?
        .ok_or_else(|| FlightError::UnknownBody(target_body.to_string()))?;

    let mut sampler = TelemetrySampler::new(config.control.retry);
    let snapshot = sampler.sample(vessel)?;
    let node = plan_transfer(&snapshot, &target, &config.maneuver)?;
    info!(
        "transfer to {}: {:.1} m/s prograde at ut {:.1} ({:.1} s from now), burn {:.1} s",
        target.name,
        node.delta_v.prograde,
        node.ut,
        node.ut - snapshot.ut,
        node.burn_duration
    );

    let stages = StageSequence::in_flight(config.stages.clone(), snapshot.stage);
    execute_node(vessel, node, stages, &mut sampler, config, cancel)
}

/// Fly one maneuver node to completion. The node is consumed.
pub fn execute_node<V: Vessel + ?Sized>(
    vessel: &mut V,
    node: ManeuverNode,
    stages: StageSequence,
    sampler: &mut TelemetrySampler,
    config: &FlightConfig,
    cancel: &CancelToken,
) -> Result<TransferReport, FlightError> {
    config.validate()?;
    let mut executor = ManeuverExecutor::new(node, config.maneuver.clone(), stages);
    let end = fly(&mut executor, vessel, sampler, config.control.tick, cancel)?;

    Ok(TransferReport {
        node_ut: executor.node().ut,
        planned_delta_v: executor.planned_delta_v(),
        achieved_delta_v: executor.achieved_delta_v(),
        apoapsis: end.apoapsis,
        periapsis: end.periapsis,
        ut: end.ut,
        retries: sampler.retries(),
    })
}
