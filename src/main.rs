use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use waypoint_guide::compass::bearing_to_direction;
use waypoint_guide::waypoint::load_waypoints_file;
use waypoint_guide::{
    GuideConfig, NavigationPhase, NavigationSession, NavigationState, NmeaLocationSource, Result,
};

/// Walk a waypoint path with live guidance from an NMEA GPS receiver.
#[derive(Parser, Debug)]
#[command(name = "waypoint-guide", version)]
struct Args {
    /// JSON file with the ordered waypoint records
    #[arg(short, long)]
    waypoints: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device or recorded NMEA log (overrides the config)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Pause between fixes when replaying a log, in milliseconds
    #[arg(long)]
    replay_interval_ms: Option<u64>,

    /// Print each snapshot as one JSON line
    #[arg(long)]
    json: bool,

    /// Stop after this many seconds without an update
    #[arg(long, default_value_t = 30)]
    idle_timeout: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => GuideConfig::load(path)?,
        None => GuideConfig::default(),
    };
    if let Some(device) = args.device {
        config.location.device = device;
    }

    let waypoints = load_waypoints_file(&args.waypoints)?;
    println!(
        "Loaded {} waypoints from {}",
        waypoints.len(),
        args.waypoints.display()
    );

    let mut source = NmeaLocationSource::new(&config.location.device);
    if let Some(ms) = args.replay_interval_ms {
        source = source.with_replay_interval(Duration::from_millis(ms));
    }

    let mut session = NavigationSession::from_config(Box::new(source), &config);
    let updates = session.subscribe();
    session.set_waypoints(waypoints);
    session.set_enabled(true);

    if !session.is_subscribed() {
        error!("{}", session.snapshot().instruction);
        return Ok(());
    }

    println!("Waiting for GPS fix...");
    let idle_timeout = Duration::from_secs(args.idle_timeout);

    // Main guidance loop
    loop {
        match updates.recv_timeout(idle_timeout) {
            Ok(state) => {
                print_state(&state, args.json)?;
                if state.phase() == NavigationPhase::Arrived {
                    println!("Destination reached.");
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                info!("No update for {}s, stopping", args.idle_timeout);
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    session.set_enabled(false);
    Ok(())
}

fn print_state(state: &NavigationState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(state)?);
        return Ok(());
    }

    println!("{}", state.instruction);

    if let Some(fix) = &state.location {
        println!("  Position: {}", fix.position);
        if let Some(speed) = fix.speed {
            println!("  Speed: {:.1} m/s", speed);
        }
        if let Some(sats) = fix.satellites {
            println!("  Satellites: {}", sats);
        }
    }

    if let (Some(next), Some(distance), Some(bearing)) =
        (state.next_index, state.distance_to_next, state.bearing_to_next)
    {
        println!(
            "  → Next waypoint #{}: {:.1}m, bearing {:.1}° ({})",
            next,
            distance,
            bearing,
            bearing_to_direction(bearing)
        );
    }

    match state.heading {
        Some(heading) => println!(
            "  Heading: {:.1}° ({}), relative {:+.1}°",
            heading,
            bearing_to_direction(heading),
            state.relative_bearing
        ),
        None => println!("  Heading: N/A (need movement or compass)"),
    }

    println!();
    Ok(())
}
