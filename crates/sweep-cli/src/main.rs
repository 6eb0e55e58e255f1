use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use sweep_core::{Algorithm, GridError, SweepSpec, Topology};
use sweep_runner::{append_records, run_sweep, ProcessSimulator};

#[derive(Parser)]
#[command(
    name = "sweep",
    version,
    about = "Convergence benchmark harness driving an external gossip/push-sum simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TopologyArg {
    #[value(name = "line")]
    Line,
    #[value(name = "3d")]
    Grid3d,
    #[value(name = "imp3d")]
    ImperfectGrid3d,
    #[value(name = "full")]
    FullMesh,
}

impl From<TopologyArg> for Topology {
    fn from(value: TopologyArg) -> Self {
        match value {
            TopologyArg::Line => Topology::Line,
            TopologyArg::Grid3d => Topology::Grid3d,
            TopologyArg::ImperfectGrid3d => Topology::ImperfectGrid3d,
            TopologyArg::FullMesh => Topology::FullMesh,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    #[value(name = "gossip")]
    Gossip,
    #[value(name = "push-sum")]
    PushSum,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Gossip => Algorithm::Gossip,
            AlgorithmArg::PushSum => Algorithm::PushSum,
        }
    }
}

/// Grid flags shared by `run` and `describe`. Anything left unset
/// falls back to the YAML spec (if given) and then to the defaults.
#[derive(Args, Clone, Debug, Default)]
struct GridArgs {
    /// Simulator command, whitespace-separated (e.g. "gleam run").
    #[arg(long)]
    simulator: Option<String>,
    #[arg(long, value_delimiter = ',')]
    sizes: Vec<u32>,
    #[arg(long, value_delimiter = ',', value_enum)]
    topologies: Vec<TopologyArg>,
    #[arg(long, value_delimiter = ',', value_enum)]
    algorithms: Vec<AlgorithmArg>,
    #[arg(long, value_delimiter = ',')]
    kill_percents: Vec<u32>,
    #[arg(long)]
    trials: Option<usize>,
    /// Kill a simulator run that exceeds this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Ledger CSV path (created with header, or appended to).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full sweep and append results to the ledger.
    Run {
        /// YAML sweep spec; flags override individual fields.
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        grid: GridArgs,
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved grid without running anything.
    Describe {
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        grid: GridArgs,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, grid, json } => run(config.as_deref(), &grid, json),
        Commands::Describe { config, grid, json } => describe(config.as_deref(), &grid, json),
    }
}

fn run(config: Option<&Path>, grid: &GridArgs, json: bool) -> Result<()> {
    let spec = resolve_spec(config, grid)?;
    spec.validate()?;

    let simulator = ProcessSimulator::from_spec(&spec);
    let outcome = run_sweep(&simulator, &spec);
    let write = append_records(&spec.ledger, &outcome.records, spec.trials)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "attempted": outcome.attempted,
                "complete": outcome.records.len(),
                "dropped": outcome.dropped,
                "rows_written": write.rows,
                "ledger": spec.ledger.display().to_string(),
                "ledger_created": write.created,
            }))?
        );
    } else {
        println!("configurations attempted: {}", outcome.attempted);
        println!("configurations dropped: {}", outcome.dropped);
        println!("rows written: {}", write.rows);
        println!(
            "CSV {} {}",
            if write.created { "saved to" } else { "appended to" },
            spec.ledger.display()
        );
    }
    Ok(())
}

fn describe(config: Option<&Path>, grid: &GridArgs, json: bool) -> Result<()> {
    let spec = resolve_spec(config, grid)?;
    // A grid can be described before the simulator command is known.
    match spec.validate() {
        Ok(()) | Err(GridError::EmptyCommand) => {}
        Err(err) => return Err(err.into()),
    }

    let total = spec.total_configurations();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "simulator": spec.simulator,
                "sizes": spec.sizes,
                "topologies": join_axis(&spec.topologies),
                "algorithms": join_axis(&spec.algorithms),
                "kill_percents": spec.kill_percents,
                "trials": spec.trials,
                "timeout_secs": spec.timeout_secs,
                "configurations": total,
                "total_trials": total * spec.trials,
                "ledger": spec.ledger.display().to_string(),
            }))?
        );
    } else {
        println!("simulator: {}", if spec.simulator.is_empty() {
            "(not set)".to_string()
        } else {
            spec.simulator.join(" ")
        });
        println!("sizes: {}", join_axis(&spec.sizes));
        println!("topologies: {}", join_axis(&spec.topologies));
        println!("algorithms: {}", join_axis(&spec.algorithms));
        println!("kill_percents: {}", join_axis(&spec.kill_percents));
        println!("trials: {}", spec.trials);
        match spec.timeout_secs {
            Some(secs) => println!("timeout_secs: {secs}"),
            None => println!("timeout_secs: none"),
        }
        println!("configurations: {total}");
        println!("total_trials: {}", total * spec.trials);
        println!("ledger: {}", spec.ledger.display());
    }
    Ok(())
}

fn resolve_spec(config: Option<&Path>, grid: &GridArgs) -> Result<SweepSpec> {
    let mut spec = match config {
        Some(path) => SweepSpec::from_yaml_file(path)?,
        None => SweepSpec::default(),
    };
    if let Some(command) = &grid.simulator {
        spec.simulator = command.split_whitespace().map(String::from).collect();
    }
    if !grid.sizes.is_empty() {
        spec.sizes = grid.sizes.clone();
    }
    if !grid.topologies.is_empty() {
        spec.topologies = grid.topologies.iter().copied().map(Topology::from).collect();
    }
    if !grid.algorithms.is_empty() {
        spec.algorithms = grid.algorithms.iter().copied().map(Algorithm::from).collect();
    }
    if !grid.kill_percents.is_empty() {
        spec.kill_percents = grid.kill_percents.clone();
    }
    if let Some(trials) = grid.trials {
        spec.trials = trials;
    }
    if grid.timeout_secs.is_some() {
        spec.timeout_secs = grid.timeout_secs;
    }
    if let Some(out) = &grid.out {
        spec.ledger = out.clone();
    }
    Ok(spec)
}

fn join_axis<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
