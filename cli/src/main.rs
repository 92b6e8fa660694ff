// cli/src/main.rs
//
// Thin harness around the intersection-control library: train a value
// table, or simulate a day under one of the controllers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use intersection_control_core::mdp::{MdpConfig, SolverConfig, Trainer, ValueTableStore};
use intersection_control_core::orchestrator::{
    averaged_series, write_series_csv, FrameObserver, Intersection, IntersectionSnapshot, Pacing,
    Runner, SimulationConfig,
};
use intersection_control_core::policy::{create_controller, ControllerConfig, FixedTimePlan};
use intersection_control_core::FatalError;

#[derive(Parser, Debug)]
#[command(name = "intersection-control", about = "Signal control for a four-way junction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve the MDP and persist a value table per horizon step
    Train {
        /// Discount factor in [0, 1]
        #[arg(long, default_value_t = 0.9)]
        discount: f64,

        /// Number of backward-induction steps
        #[arg(long, default_value_t = 15)]
        horizon: usize,

        /// Directory holding value tables
        #[arg(long, default_value = "values")]
        tables: PathBuf,

        /// Continue from the latest compatible persisted horizon
        #[arg(long)]
        resume: bool,
    },

    /// Run the microsimulation under a controller
    Simulate {
        #[arg(long, value_enum, default_value_t = ControllerKind::Optimal)]
        controller: ControllerKind,

        /// Discount the value table was trained with (optimal controller)
        #[arg(long, default_value_t = 0.9)]
        discount: f64,

        /// Horizon of the value table to load (optimal controller)
        #[arg(long, default_value_t = 15)]
        horizon: usize,

        #[arg(long, default_value = "values")]
        tables: PathBuf,

        /// Optional JSON file with a full simulation config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Start time in seconds past midnight (28800 = 08:00)
        #[arg(long)]
        start_time: Option<f64>,

        /// Days to simulate
        #[arg(long)]
        days: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Pace the run against the wall clock and log frames
        #[arg(long)]
        render: bool,

        /// Simulated seconds per wall second when rendering
        #[arg(long, default_value_t = 1.0)]
        time_scale: f64,

        /// Prefix for the per-minute CSV exports
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ControllerKind {
    Optimal,
    FixedTime,
    Actuated,
}

/// Logs a compact summary of each frame
struct LogObserver;

impl FrameObserver for LogObserver {
    fn on_frame(&mut self, snapshot: &IntersectionSnapshot) {
        let counts: Vec<usize> = snapshot.lanes.iter().map(|l| l.count).collect();
        debug!(
            time = snapshot.time_of_day_secs,
            phase = ?snapshot.phase,
            elapsed = snapshot.phase_elapsed_secs,
            ?counts,
            "frame"
        );
    }
}

fn load_sim_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn export_series(prefix: &str, runner: &Runner) -> Result<()> {
    let (wait, cars) = averaged_series(runner.completed_days());
    for (suffix, series) in [("wait", &wait), ("cars", &cars)] {
        let path = format!("{}-{}.csv", prefix, suffix);
        let file = File::create(&path).with_context(|| format!("creating {}", path))?;
        write_series_csv(BufWriter::new(file), series)
            .with_context(|| format!("writing {}", path))?;
        info!(path = %path, "series exported");
    }
    Ok(())
}

fn train(discount: f64, horizon: usize, tables: PathBuf, resume: bool) -> Result<(), FatalError> {
    let solver = SolverConfig { discount, horizon };
    Trainer::new(MdpConfig::default(), solver, ValueTableStore::new(tables))
        .with_resume(resume)
        .run()?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            discount,
            horizon,
            tables,
            resume,
        } => {
            train(discount, horizon, tables, resume)?;
            println!("Training finished.");
        }

        Command::Simulate {
            controller,
            discount,
            horizon,
            tables,
            config,
            start_time,
            days,
            seed,
            render,
            time_scale,
            output,
        } => {
            let mut sim_config = load_sim_config(config.as_deref())?;
            if let Some(t) = start_time {
                sim_config.start_time_secs = t;
            }
            if let Some(d) = days {
                sim_config.num_days = d;
            }
            if let Some(s) = seed {
                sim_config.seed = s;
            }

            let controller_config = match controller {
                ControllerKind::Optimal => ControllerConfig::Optimal {
                    table_dir: tables,
                    solver: SolverConfig { discount, horizon },
                    mdp: MdpConfig::default(),
                },
                ControllerKind::FixedTime => ControllerConfig::FixedTime {
                    plan: FixedTimePlan::default(),
                },
                ControllerKind::Actuated => ControllerConfig::Actuated,
            };

            let intersection = Intersection::new(sim_config).map_err(FatalError::from)?;
            let controller = create_controller(&controller_config).map_err(FatalError::from)?;
            let mut runner = Runner::new(intersection, controller);
            if render {
                runner = runner
                    .with_pacing(Pacing {
                        time_scale,
                        ..Default::default()
                    })
                    .map_err(FatalError::from)?
                    .with_observer(Box::new(LogObserver));
            }

            let summary = runner.run().map_err(FatalError::from)?;

            println!("Days simulated:      {}", summary.days);
            println!("Cars passed:         {}", summary.cars_passed);
            println!("Average wait (s):    {:.3}", summary.average_wait);
            println!("Average max wait (s): {:.3}", summary.average_max_wait);
            println!("Max queue length:    {}", summary.max_queue_length);
            for day in runner.completed_days() {
                println!(
                    "  day {}: {} cars, average wait {:.3}s",
                    day.day,
                    day.cars_passed,
                    day.average_wait().unwrap_or(0.0)
                );
            }

            if let Some(prefix) = output {
                export_series(&prefix, &runner)?;
            }
        }
    }

    Ok(())
}
