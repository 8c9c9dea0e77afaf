use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use rocket_autopilot::flight::{launch_to_orbit_with, transfer_to_body_with, CancelToken};
use rocket_autopilot::sim::{presets, SimConnection};
use rocket_autopilot::FlightConfig;

#[derive(Parser)]
#[command(author, version, about = "Fly the preset two-stage vehicle to orbit in the built-in simulator")]
struct Cli {
    /// Body to launch from
    #[arg(long, default_value = "kerbin")]
    body: String,

    /// Launch heading, compass degrees (east = 90)
    #[arg(long, default_value_t = 90.0)]
    heading: f64,

    /// Target circular orbit altitude (m)
    #[arg(long, default_value_t = 80_000.0)]
    altitude: f64,

    /// Body to fly a Hohmann departure burn toward once in orbit
    #[arg(long)]
    target: Option<String>,

    /// TOML file overriding guidance and loop tunables
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FlightConfig::load(path)?,
        None => FlightConfig::default(),
    };

    // -----------------------------------------------------------------------
    // Session and vehicle
    // -----------------------------------------------------------------------
    let conn = SimConnection::connect(&format!("sim://{}", cli.body))?;
    let vehicle = presets::two_stage_orbiter();
    let (mass, delta_v) = (vehicle.total_mass(), vehicle.total_delta_v());
    let mut vessel = conn.launch_vessel(vehicle);
    let cancel = CancelToken::new();

    // -----------------------------------------------------------------------
    // Fly
    // -----------------------------------------------------------------------
    let ascent = launch_to_orbit_with(&conn, &mut vessel, cli.heading, cli.altitude, &config, &cancel)?;
    let transfer = match &cli.target {
        Some(name) => Some(transfer_to_body_with(&conn, &mut vessel, name, &config, &cancel)?),
        None => None,
    };

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  AUTOPILOT FLIGHT SUMMARY: {} from {}", vessel.name(), conn.home().name);
    println!("====================================================================");
    println!();
    println!("  Session:       {}", conn.endpoint());
    println!();
    println!("  Vehicle");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Liftoff mass:  {:>10.0} kg   Ideal delta-v: {:>8.0} m/s", mass, delta_v);
    println!("  Heading:       {:>10.1} deg  Target alt:    {:>8.0} m", cli.heading, cli.altitude);
    println!();

    println!("  Ascent");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Apoapsis:      {:>10.0} m    error {:>+8.0} m",
        ascent.apoapsis,
        ascent.apoapsis - cli.altitude
    );
    println!(
        "  Periapsis:     {:>10.0} m    error {:>+8.0} m",
        ascent.periapsis,
        ascent.periapsis - cli.altitude
    );
    println!("  Final pitch:   {:>10.3} deg", ascent.final_pitch);
    println!(
        "  Stage events:  {:>10}      Trims: {:>3}      Retries: {:>3}",
        ascent.stages_fired, ascent.trims, ascent.retries
    );
    println!("  Orbit at:      {:>10.1} s", ascent.ut);
    println!();

    if let (Some(name), Some(t)) = (&cli.target, &transfer) {
        println!("  Transfer to {}", name);
        println!("  ──────────────────────────────────────────────────────────────────");
        println!("  Node time:     {:>10.1} s", t.node_ut);
        println!(
            "  Delta-v:       {:>10.1} m/s  planned, {:.1} m/s achieved",
            t.planned_delta_v, t.achieved_delta_v
        );
        println!("  Apoapsis:      {:>10.0} m", t.apoapsis);
        println!("  Periapsis:     {:>10.0} m", t.periapsis);
        println!("  Cutoff at:     {:>10.1} s", t.ut);
        println!();
    }

    println!("====================================================================");
    println!();
    Ok(())
}
