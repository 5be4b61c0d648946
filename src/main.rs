use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use swarm_engine::boids::Flock;
use swarm_engine::config::SimConfig;
use swarm_engine::sink::{ZmqPublisher, run};

#[derive(FromArgs, Debug)]
/// Flocking simulation that publishes every tick over ZeroMQ.
struct Args {
    /// JSON config file; flags below override its values
    #[argh(option)]
    config: Option<PathBuf>,

    /// number of boids
    #[argh(option, short = 'n')]
    boids: Option<usize>,

    /// publisher endpoint, e.g. tcp://127.0.0.1:5555
    #[argh(option)]
    endpoint: Option<String>,

    /// seed for the initial flock
    #[argh(option)]
    seed: Option<u64>,

    /// stop after this many ticks
    #[argh(option)]
    ticks: Option<u64>,

    /// pause between ticks in milliseconds
    #[argh(option)]
    tick_delay_ms: Option<u64>,

    /// half-width of the square spawn area
    #[argh(option)]
    spawn_bounds: Option<f32>,

    /// largest initial velocity component
    #[argh(option)]
    initial_speed: Option<f32>,

    /// half-width of the world
    #[argh(option)]
    margin: Option<f32>,

    /// neighbour detection radius
    #[argh(option)]
    visual_range: Option<f32>,

    /// separation radius
    #[argh(option)]
    protected_range: Option<f32>,

    /// separation weight
    #[argh(option)]
    separation: Option<f32>,

    /// alignment weight
    #[argh(option)]
    alignment: Option<f32>,

    /// cohesion weight
    #[argh(option)]
    cohesion: Option<f32>,

    /// minimum speed
    #[argh(option)]
    min_speed: Option<f32>,

    /// maximum speed
    #[argh(option)]
    max_speed: Option<f32>,

    /// print the effective config as JSON and exit
    #[argh(switch)]
    print_config: bool,

    /// enable debug logging
    #[argh(switch, short = 'v')]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => SimConfig::default(),
        };
        let params = &mut config.params;
        params.margin = self.margin.unwrap_or(params.margin);
        params.visual_range = self.visual_range.unwrap_or(params.visual_range);
        params.protected_range = self.protected_range.unwrap_or(params.protected_range);
        params.separation_factor = self.separation.unwrap_or(params.separation_factor);
        params.alignment_factor = self.alignment.unwrap_or(params.alignment_factor);
        params.cohesion_factor = self.cohesion.unwrap_or(params.cohesion_factor);
        params.min_speed = self.min_speed.unwrap_or(params.min_speed);
        params.max_speed = self.max_speed.unwrap_or(params.max_speed);

        config.boids = self.boids.unwrap_or(config.boids);
        config.tick_delay_ms = self.tick_delay_ms.unwrap_or(config.tick_delay_ms);
        config.spawn_bounds = self.spawn_bounds.unwrap_or(config.spawn_bounds);
        config.initial_speed = self.initial_speed.unwrap_or(config.initial_speed);
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.ticks.is_some() {
            config.max_ticks = self.ticks;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let print_config = args.print_config;
    let config = args.into_config()?;
    if print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut flock = Flock::initialize(
        config.boids,
        config.spawn_bounds,
        config.initial_speed,
        config.params,
        &mut rng,
    )?;
    info!("engine started with {} boids (seed {seed})", flock.len());

    let mut publisher = ZmqPublisher::bind(&config.endpoint)
        .await
        .context("cannot start publisher")?;

    let progress = match config.max_ticks {
        Some(limit) => {
            let bar = ProgressBar::new(limit);
            bar.set_style(ProgressStyle::with_template(
                "[{elapsed_precise}/{eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )?);
            bar
        }
        None => ProgressBar::hidden(),
    };

    let ticks = run(
        &mut flock,
        &mut publisher,
        config.tick_delay(),
        config.max_ticks,
        &progress,
    )
    .await;
    info!("finished after {ticks} ticks");
    Ok(())
}
