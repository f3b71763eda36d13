use clap::{Parser, Subcommand};
use pr_core::Point3;
use pr_model::{Material, ModelError, PipeSystemConfig, SystemType, bill_of_materials, validate};
use pr_routing::{
    CameraState, ControllerCommand, PointerPosition, RoutingCommand, RoutingController,
    RoutingError, RoutingMode, RoutingSettings, WorkPlane,
};
use pr_snap::FloorplanSnapshot;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pr-cli")]
#[command(about = "Pipe routing CLI - validate, summarize and replay pipe system layouts", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every pipe system in a JSON or YAML file
    Validate {
        /// Path to the pipe systems file
        systems_path: PathBuf,
        /// Design fluid temperature in °F, checked against material limits
        #[arg(long)]
        temperature: Option<f64>,
    },
    /// Print length, cost and fittings per pipe system
    Summary {
        /// Path to the pipe systems file
        systems_path: PathBuf,
    },
    /// Run a scripted routing session and export the result
    Replay {
        /// Path to the YAML script
        script_path: PathBuf,
        /// Routing settings file (YAML or JSON)
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Pipe systems to load before the script runs
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output JSON file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Failed to read script {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid script: {0}")]
    Script(#[from] serde_yaml::Error),

    #[error("Output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{failed} of {total} pipe systems failed validation")]
    Invalid { failed: usize, total: usize },

    #[error("{failed} script step(s) failed")]
    StepsFailed { failed: usize },
}

type CliResult<T> = Result<T, CliError>;

/// A scripted session: floorplan plus the steps a user would perform.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Script {
    floorplan: FloorplanSnapshot,
    /// Elevation of the plane pointer steps are ray-cast against.
    work_plane: f64,
    camera: Option<ScriptCamera>,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptCamera {
    position: Point3,
    target: Point3,
    #[serde(default = "default_fov")]
    fov_deg: f64,
    #[serde(default = "default_aspect")]
    aspect: f64,
}

fn default_fov() -> f64 {
    CameraState::default().fov_deg
}

fn default_aspect() -> f64 {
    CameraState::default().aspect
}

impl From<ScriptCamera> for CameraState {
    fn from(c: ScriptCamera) -> Self {
        CameraState {
            position: c.position,
            target: c.target,
            fov_deg: c.fov_deg,
            aspect: c.aspect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Start { mode: RoutingMode },
    Select { id: Option<String> },
    Move { x: f64, y: f64, z: f64 },
    Click { x: f64, y: f64, z: f64 },
    PointerMove { px: f64, py: f64 },
    PointerClick { px: f64, py: f64 },
    Finish,
    Cancel,
    Undo,
    CycleMaterial,
    CycleDiameter,
    SetMaterial { material: Material },
    SetDiameter { diameter: f64 },
    SetSystemType { system_type: SystemType },
}

impl Step {
    fn into_command(self, camera: CameraState) -> ControllerCommand {
        match self {
            Step::Start { mode } => ControllerCommand::Start(mode),
            Step::Select { id } => ControllerCommand::SelectSystem(id),
            Step::Move { x, y, z } => ControllerCommand::HoverAt(Point3::new(x, y, z)),
            Step::Click { x, y, z } => ControllerCommand::ClickAt(Point3::new(x, y, z)),
            Step::PointerMove { px, py } => ControllerCommand::PointerMove {
                pointer: PointerPosition { x: px, y: py },
                camera,
            },
            Step::PointerClick { px, py } => ControllerCommand::Click {
                pointer: PointerPosition { x: px, y: py },
                camera,
            },
            Step::Finish => ControllerCommand::Action(RoutingCommand::FinishPath),
            Step::Cancel => ControllerCommand::Action(RoutingCommand::CancelPath),
            Step::Undo => ControllerCommand::Action(RoutingCommand::RemoveLastPoint),
            Step::CycleMaterial => ControllerCommand::Action(RoutingCommand::CycleMaterial),
            Step::CycleDiameter => ControllerCommand::Action(RoutingCommand::CycleDiameter),
            Step::SetMaterial { material } => ControllerCommand::SetMaterial(material),
            Step::SetDiameter { diameter } => ControllerCommand::SetDiameter(diameter),
            Step::SetSystemType { system_type } => ControllerCommand::SetSystemType(system_type),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            systems_path,
            temperature,
        } => cmd_validate(&systems_path, temperature),
        Commands::Summary { systems_path } => cmd_summary(&systems_path),
        Commands::Replay {
            script_path,
            settings,
            input,
            out,
        } => cmd_replay(
            &script_path,
            settings.as_deref(),
            input.as_deref(),
            out.as_deref(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_systems(path: &Path) -> CliResult<Vec<PipeSystemConfig>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let configs = if is_json {
        pr_model::load_json(path)?
    } else {
        pr_model::load_yaml(path)?
    };
    Ok(configs)
}

fn cmd_validate(path: &Path, temperature: Option<f64>) -> CliResult<()> {
    println!("Validating pipe systems: {}", path.display());
    let configs = load_systems(path)?;
    let ctx = pr_model::ValidationContext {
        design_temperature_f: temperature,
    };

    let mut failed = 0;
    for config in &configs {
        let report = pr_model::validate_with(config, &ctx);
        if report.valid {
            println!("✓ {} ({})", config.name, config.id);
        } else {
            failed += 1;
            println!("✗ {} ({})", config.name, config.id);
            for issue in &report.errors {
                println!("    {issue}");
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Invalid {
            failed,
            total: configs.len(),
        });
    }
    println!("All {} pipe systems are valid", configs.len());
    Ok(())
}

fn cmd_summary(path: &Path) -> CliResult<()> {
    let configs = load_systems(path)?;
    if configs.is_empty() {
        println!("No pipe systems found");
        return Ok(());
    }

    let cost_settings = pr_model::CostSettings::default();
    let mut total_length = 0.0;
    let mut total_cost = 0.0;
    for config in &configs {
        let bom = bill_of_materials(config, &cost_settings);
        let profile = config.material.profile();
        println!(
            "{} - {} {}\" {} ({} points)",
            config.name,
            profile.display_name,
            config.diameter,
            config.system_type.display_name(),
            config.path.len()
        );
        println!("  Length:   {:.2} ft", bom.pipe_length_ft);
        println!("  Supports: {}", bom.supports);
        println!("  Cost:     ${:.2}", bom.cost);
        for (fitting, count) in &bom.fittings {
            println!("  {fitting:?}: {count}");
        }
        if !validate(config).valid {
            println!("  (has validation issues; run `validate` for details)");
        }
        total_length += bom.pipe_length_ft;
        total_cost += bom.cost;
    }
    println!(
        "Total: {} systems, {:.2} ft, ${:.2}",
        configs.len(),
        total_length,
        total_cost
    );
    Ok(())
}

fn cmd_replay(
    script_path: &Path,
    settings_path: Option<&Path>,
    input: Option<&Path>,
    out: Option<&Path>,
) -> CliResult<()> {
    let content = std::fs::read_to_string(script_path).map_err(|e| CliError::ScriptRead {
        path: script_path.to_path_buf(),
        source: e,
    })?;
    let script: Script = serde_yaml::from_str(&content)?;
    let settings = match settings_path {
        Some(path) => RoutingSettings::load(path)?,
        None => RoutingSettings::default(),
    };

    let mut controller = RoutingController::new(settings);
    if let Some(path) = input {
        let summary = controller.import(load_systems(path)?);
        for (index, error) in &summary.failed {
            warn!(index, %error, "input pipe system skipped");
        }
    }
    controller.floorplan_changed(&script.floorplan);

    let ray_caster = WorkPlane {
        elevation: script.work_plane,
    };
    let camera = script.camera.map(CameraState::from).unwrap_or_default();
    let total = script.steps.len();
    let mut failed = 0;
    for (index, step) in script.steps.into_iter().enumerate() {
        if let Err(error) = controller.dispatch(step.into_command(camera), &ray_caster) {
            failed += 1;
            warn!(step = index + 1, %error, "script step failed");
        }
    }

    let configs = controller.registry().export_all();
    let json = pr_model::to_json_string(&configs)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)?;
            println!(
                "Replayed {total} steps, wrote {} pipe systems to {}",
                configs.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    if failed > 0 {
        return Err(CliError::StepsFailed { failed });
    }
    Ok(())
}
