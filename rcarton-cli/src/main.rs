use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rcarton_core::{FoldConfig, FoldSimulation};
use rcarton_model::{DrivenMap, FoldEdge, Panel, PanelId, Skeleton, SkinnedGeometry, TimingWindow};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "rcarton")]
#[command(about = "Plan and rig the folding of a flat die-cut layout")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Root, driven map and fold creases
    #[command(name = "topology")]
    Topology(CommonArgs),
    /// Fold order and timing windows
    #[command(name = "schedule")]
    Schedule(CommonArgs),
    /// Skeleton and skinned geometry
    #[command(name = "rig")]
    Rig(CommonArgs),
    /// Bone rotations, and optionally deformed positions, at one fold progress
    #[command(name = "pose")]
    Pose(PoseArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Layout document: `{"panels": [...], "driven"?, "root"?, "order"?}`
    #[arg(long, required = true)]
    input: PathBuf,
    /// JSON fold configuration, defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct PoseArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = 1.0)]
    progress: f32,
    /// Include the deformed vertex positions
    #[arg(long, default_value_t = false)]
    positions: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutDocument {
    panels: Vec<Panel>,
    #[serde(default)]
    driven: Option<DrivenMap>,
    #[serde(default)]
    root: Option<PanelId>,
    #[serde(default)]
    order: Option<Vec<PanelId>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopologyReport<'a> {
    root: &'a str,
    driven: &'a DrivenMap,
    fold_edges: &'a [FoldEdge],
    unreached: &'a [PanelId],
}

#[derive(Debug, Serialize)]
struct ScheduleReport<'a> {
    sequence: &'a [PanelId],
    windows: &'a [TimingWindow],
}

#[derive(Debug, Serialize)]
struct RigReport<'a> {
    skeleton: &'a Skeleton,
    geometry: &'a SkinnedGeometry,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BoneRotation<'a> {
    bone: &'a str,
    /// `[x, y, z, w]`
    rotation: [f32; 4],
}

#[derive(Debug, Serialize)]
struct PoseReport<'a> {
    progress: f32,
    bones: Vec<BoneRotation<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    positions: Option<Vec<[f32; 3]>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Topology(args) => run_topology(&args),
        Command::Schedule(args) => run_schedule(&args),
        Command::Rig(args) => run_rig(&args),
        Command::Pose(args) => run_pose(&args),
    }
}

fn load_config(path: Option<&Path>) -> Result<FoldConfig> {
    let Some(path) = path else {
        return Ok(FoldConfig::default());
    };
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open config {}", path.display()))?;
    FoldConfig::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("invalid config {}", path.display()))
}

fn load_simulation(args: &CommonArgs) -> Result<FoldSimulation> {
    let config = load_config(args.config.as_deref())?;
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read layout {}", args.input.display()))?;
    let document: LayoutDocument = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse layout {}", args.input.display()))?;
    tracing::event!(
        tracing::Level::INFO,
        "loaded {} panel(s) from {}",
        document.panels.len(),
        args.input.display()
    );

    let mut simulation = FoldSimulation::new(config)?;
    simulation.set_panels(document.panels);
    simulation.set_driven_map(document.driven);
    simulation.set_root(document.root);
    simulation.set_fold_order(document.order);
    Ok(simulation)
}

fn emit<T: Serialize>(out: Option<&Path>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

fn run_topology(args: &CommonArgs) -> Result<()> {
    let mut simulation = load_simulation(args)?;
    let Some(plan) = simulation.plan() else {
        bail!("{} holds no panel", args.input.display());
    };
    emit(
        args.out.as_deref(),
        &TopologyReport {
            root: &plan.root,
            driven: &plan.driven,
            fold_edges: &plan.fold_edges,
            unreached: &plan.unreached,
        },
    )
}

fn run_schedule(args: &CommonArgs) -> Result<()> {
    let mut simulation = load_simulation(args)?;
    let Some(plan) = simulation.plan() else {
        bail!("{} holds no panel", args.input.display());
    };
    emit(
        args.out.as_deref(),
        &ScheduleReport {
            sequence: &plan.sequence,
            windows: &plan.schedule.windows,
        },
    )
}

fn run_rig(args: &CommonArgs) -> Result<()> {
    let mut simulation = load_simulation(args)?;
    let Some(rig) = simulation.rig() else {
        bail!("{} holds nothing to rig", args.input.display());
    };
    emit(
        args.out.as_deref(),
        &RigReport {
            skeleton: rig.skeleton(),
            geometry: rig.geometry(),
        },
    )
}

fn run_pose(args: &PoseArgs) -> Result<()> {
    let mut simulation = load_simulation(&args.common)?;
    simulation.set_fold_progress(args.progress);
    let Some(rig) = simulation.rig() else {
        bail!("{} holds nothing to rig", args.common.input.display());
    };

    let progress = simulation.fold_progress();
    let pose = rig.pose(progress);
    let bones = rig
        .skeleton()
        .bones
        .iter()
        .zip(&pose.rotations)
        .map(|(bone, q)| BoneRotation {
            bone: &bone.id,
            rotation: [q.i, q.j, q.k, q.w],
        })
        .collect();
    let positions = args.positions.then(|| rig.deformed_positions(progress));

    emit(
        args.common.out.as_deref(),
        &PoseReport {
            progress,
            bones,
            positions,
        },
    )
}
