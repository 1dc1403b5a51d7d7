use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wedm_controls::GapVoltageController;
use wedm_materials::MaterialDatabase;
use wedm_project::Project;
use wedm_results::{
    Recorder, RunManifest, RunMetadata, RunStore, RunSummary, SampleSchedule, compute_run_id,
    timestamp_now,
};
use wedm_sim::{Action, EpisodeSummary, ProcessState, SIGNAL_NAMES, WireEdmEnv, run_episode};

const DEFAULT_SIGNALS: &[&str] = &[
    "voltage",
    "current",
    "gap_width",
    "wire_velocity",
    "spark_status",
    "debris_density",
    "wire_average_temperature",
];

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] wedm_project::ProjectError),
    #[error(transparent)]
    Material(#[from] wedm_materials::MaterialError),
    #[error(transparent)]
    Control(#[from] wedm_controls::ControlError),
    #[error(transparent)]
    Sim(#[from] wedm_sim::SimError),
    #[error(transparent)]
    Results(#[from] wedm_results::ResultsError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "wedm")]
#[command(about = "Wire EDM process simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a project file (YAML or JSON)
    Validate {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// List wire materials
    Materials {
        /// Additional materials JSON, merged over the built-in set
        #[arg(long)]
        file: Option<PathBuf>,
        /// Write the resulting database as JSON
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Run one episode with the gap-voltage controller
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// Step budget
        #[arg(long, default_value_t = 100_000)]
        steps: u64,
        /// Episode seed, overrides the project seed
        #[arg(long)]
        seed: Option<u64>,
        /// Save the recording in this run store
        #[arg(long)]
        store: Option<PathBuf>,
        /// Comma-separated signal names, or "all"
        #[arg(long, value_delimiter = ',')]
        signals: Option<Vec<String>>,
        /// Sample every N ticks instead of every servo tick
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Run independent episodes in parallel
    Batch {
        /// Path to the project file
        project_path: PathBuf,
        /// Number of episodes; seeds count up from the project seed
        #[arg(long)]
        episodes: u64,
        /// Step budget per episode
        #[arg(long, default_value_t = 100_000)]
        steps: u64,
    },
    /// Show a stored run
    ShowRun {
        /// Run store directory
        store: PathBuf,
        /// Run ID to display
        run_id: String,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Materials { file, export } => cmd_materials(file.as_deref(), export.as_deref()),
        Commands::Run {
            project_path,
            steps,
            seed,
            store,
            signals,
            interval,
        } => cmd_run(
            &project_path,
            steps,
            seed,
            store.as_deref(),
            signals,
            interval,
        ),
        Commands::Batch {
            project_path,
            episodes,
            steps,
        } => cmd_batch(&project_path, episodes, steps),
        Commands::ShowRun { store, run_id } => cmd_show_run(&store, &run_id),
    }
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = wedm_project::load(project_path)?;
    println!("✓ Project '{}' is valid", project.name);
    println!(
        "  {} µm gap, {} µm to cut, {} control, dt = {} µs, servo every {} µs",
        project.environment.initial_gap,
        project.environment.target_cutting_distance,
        project.control_mode,
        project.environment.dt,
        project.environment.servo_interval
    );
    Ok(())
}

fn cmd_materials(file: Option<&Path>, export: Option<&Path>) -> CliResult<()> {
    let db = match file {
        Some(path) => MaterialDatabase::load_json(path)?,
        None => MaterialDatabase::builtin(),
    };
    println!(
        "{:<12} {:>9} {:>8} {:>8} {:>10} {:>8} {:>8}",
        "name", "rho", "cp", "k", "rho_e", "T_melt", "T_break"
    );
    for (name, m) in db.iter() {
        println!(
            "{:<12} {:>9.0} {:>8.0} {:>8.1} {:>10.2e} {:>8.1} {:>8.1}",
            name,
            m.density,
            m.specific_heat,
            m.thermal_conductivity,
            m.electrical_resistivity,
            m.melting_point,
            m.breaking_temperature
        );
    }
    if let Some(path) = export {
        db.save_json(path)?;
        println!("✓ Wrote {}", path.display());
    }
    Ok(())
}

/// Controller-driven policy: every tick feeds the voltage window, servo
/// ticks get a fresh command.
fn controller_policy(
    controller: &mut GapVoltageController,
) -> impl FnMut(&ProcessState, bool) -> Action + '_ {
    move |state, is_servo| {
        controller.observe(state.time as f64, state.voltage);
        let delta = if is_servo {
            controller.command(state.target_voltage)
        } else {
            state.target_delta
        };
        Action::servo(delta)
    }
}

fn build(project: &Project, seed: u64) -> CliResult<(WireEdmEnv, GapVoltageController)> {
    let mut env = WireEdmEnv::from_project(project, &MaterialDatabase::builtin())?;
    env.reset(Some(seed));
    let controller = GapVoltageController::new(
        project.control_mode,
        project.controller.target_voltage,
        project.controller.window_us,
    )?;
    Ok((env, controller))
}

fn print_summary(summary: &EpisodeSummary) {
    println!(
        "  seed {:>6}: {:<14} {:>8} steps, {:>6} sparks, {:>5} shorts, {:.4e} mm³ removed, gap {:.2} µm",
        summary.seed,
        summary.reason.label(),
        summary.steps,
        summary.spark_count,
        summary.short_circuit_count,
        summary.removed_volume,
        summary.workpiece_position - summary.wire_position
    );
}

fn cmd_run(
    project_path: &Path,
    steps: u64,
    seed: Option<u64>,
    store: Option<&Path>,
    signals: Option<Vec<String>>,
    interval: Option<u64>,
) -> CliResult<()> {
    let project = wedm_project::load(project_path)?;
    let seed = seed.or(project.seed).unwrap_or(0);
    let (mut env, mut controller) = build(&project, seed)?;

    let schedule = match interval {
        Some(steps) => SampleSchedule::Interval { steps },
        None => SampleSchedule::ControlStep,
    };
    let names: Vec<String> = match signals {
        Some(names) if names.iter().any(|n| n == "all") => {
            SIGNAL_NAMES.iter().map(|s| s.to_string()).collect()
        }
        Some(names) => names,
        None => DEFAULT_SIGNALS.iter().map(|s| s.to_string()).collect(),
    };
    let mut recorder = Recorder::new(names, schedule, RunMetadata::from_env(&env))?;
    recorder.sample(env.state());

    println!("Running '{}' (seed {seed}, {steps} steps)", project.name);
    let started = Instant::now();
    let summary = run_episode(
        &mut env,
        steps,
        controller_policy(&mut controller),
        |state, outcome| recorder.observe(state, outcome),
    )?;
    let record = recorder.finish();
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        samples = record.len(),
        "run complete"
    );
    print_summary(&summary);

    if let Some(dir) = store {
        let store = RunStore::new(dir)?;
        let run_id = compute_run_id(&project, seed, steps)?;
        let manifest = RunManifest {
            run_id: run_id.clone(),
            project_name: project.name.clone(),
            timestamp: timestamp_now(),
            seed,
            max_steps: steps,
            summary: RunSummary::from(&summary),
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        store.save_run(&manifest, &record)?;
        println!("✓ Saved run {run_id} ({} samples)", record.len());
    }
    Ok(())
}

fn cmd_batch(project_path: &Path, episodes: u64, steps: u64) -> CliResult<()> {
    let project = wedm_project::load(project_path)?;
    let base_seed = project.seed.unwrap_or(0);
    println!(
        "Running {episodes} episodes of '{}' ({steps} steps each)",
        project.name
    );

    let started = Instant::now();
    let results: Vec<CliResult<EpisodeSummary>> = (0..episodes)
        .into_par_iter()
        .map(|i| {
            let (mut env, mut controller) = build(&project, base_seed.wrapping_add(i))?;
            let summary = run_episode(&mut env, steps, controller_policy(&mut controller), |_, _| {})?;
            Ok(summary)
        })
        .collect();

    let mut summaries = Vec::with_capacity(results.len());
    for result in results {
        summaries.push(result?);
    }
    for summary in &summaries {
        print_summary(summary);
    }
    let broken = summaries
        .iter()
        .filter(|s| s.reason == wedm_sim::TerminalReason::WireBroken)
        .count();
    println!(
        "✓ {} episodes in {:.1} s, {broken} wire breaks",
        summaries.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn cmd_show_run(store: &Path, run_id: &str) -> CliResult<()> {
    let store = RunStore::new(store)?;
    let manifest = store.load_manifest(run_id)?;
    let record = store.load_record(run_id)?;

    println!("Run: {}", manifest.run_id);
    println!("  project:   {}", manifest.project_name);
    println!("  timestamp: {}", manifest.timestamp);
    println!("  seed:      {}", manifest.seed);
    println!(
        "  result:    {} after {} steps ({} µs)",
        manifest.summary.terminal_reason, manifest.summary.steps, manifest.summary.time
    );
    println!(
        "  sparks:    {}, shorts: {}",
        manifest.summary.spark_count, manifest.summary.short_circuit_count
    );
    println!("  metadata:  {}", serde_json::to_string(&record.metadata)?);
    println!("  samples:   {}", record.len());
    for (name, series) in &record.signals {
        let last = series
            .last()
            .and_then(|v| v.as_f64())
            .map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
        println!("    {name:<28} last = {last}");
    }
    Ok(())
}
