use clap::Parser;
use client::config::{ClientConfig, LockMode};
use client::connect::connect;
use client::lifecycle::{LoggingObserver, StepEvents};
use client::link::{Link, Locked, Unlocked};
use client::query::Dispatcher;
use client::simulation::Simulation;
use log::info;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulator host
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Simulator TraCI port
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of steps to run; stops early once no vehicles are expected
    #[arg(short, long, default_value = "100")]
    steps: u32,

    /// Seconds per step (defaults to the simulator's step length)
    #[arg(short = 'l', long)]
    step_length: Option<f64>,

    /// JSON config file; command-line flags take precedence
    #[arg(short, long)]
    config: Option<String>,

    /// Connection attempts before giving up
    #[arg(long)]
    retries: Option<u32>,

    /// Delay before the first retry, in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Skip link locking (one thread only)
    #[arg(long)]
    single_threaded: bool,

    /// Print each step's events as one JSON line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = resolve_config(&args)?;

    info!("Connecting to: {}", config.address());
    let stream = connect(&config.address(), None, &config.retry)?;

    match config.lock_mode {
        LockMode::Shared => run(Locked::new(stream), &config, &args),
        LockMode::SingleThreaded => run(Unlocked::new(stream), &config, &args),
    }
}

fn resolve_config(args: &Args) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.step_length.is_some() {
        config.step_length = args.step_length;
    }
    if let Some(retries) = args.retries {
        config.retry.max_attempts = retries;
    }
    if let Some(delay) = args.retry_delay_ms {
        config.retry.initial_delay_ms = delay;
    }
    if args.single_threaded {
        config.lock_mode = LockMode::SingleThreaded;
    }
    Ok(config)
}

fn run<L: Link>(
    link: L,
    config: &ClientConfig,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let simulation = Simulation::new(Dispatcher::new(link), config.step_length)?;
    let (api_level, version) = simulation.version()?;
    info!("Simulator: {} (API level {})", version, api_level);

    if !args.json {
        simulation.add_observer(Arc::new(LoggingObserver));
    }

    for _ in 0..args.steps {
        let events = simulation.step()?;
        report(&events, args.json)?;

        if simulation.min_expected_vehicles()? == 0 {
            info!("No more vehicles expected at t={}", events.time);
            break;
        }
    }

    info!(
        "Finished at t={} after {} round trips",
        simulation.current_time(),
        simulation.dispatcher().round_trips()
    );
    simulation.close()?;
    Ok(())
}

fn report(events: &StepEvents, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(events)?);
    } else if !events.is_quiet() {
        println!(
            "t={:>8.2}  +{:<3} -{:<3} teleports {}/{}",
            events.time,
            events.departed.len(),
            events.arrived.len(),
            events.teleport_started.len(),
            events.teleport_ended.len()
        );
    }
    Ok(())
}
