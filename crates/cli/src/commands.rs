//! Scenario commands and their reports.

use crate::trials::{self, RealmParams};
use anyhow::{ensure, Context, Result};
use clap::{Args, Subcommand};
use corelib::{HashRing, NodeId};
use reshard::growth::{DEFAULT_CAPACITY_THRESHOLD, DEFAULT_LOAD_CEILING, DEFAULT_SAMPLE_SIZE};
use reshard::{ChurnStats, GrowthConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Settings shared by every command, resolved from global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub seed: u64,
    pub threads: usize,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Place a population, replay it unchanged, then replay it after one load change.
    Stability(StabilityArgs),
    /// Measure churn over many independent load changes.
    Perturb(PerturbArgs),
    /// Admit workspaces until a node hits capacity, add a node, measure churn.
    Grow(GrowArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RealmArgs {
    /// Number of nodes.
    #[arg(long, default_value_t = 5)]
    pub nodes: usize,

    /// Number of pre-existing workspaces.
    #[arg(long, default_value_t = 2000)]
    pub workspaces: usize,

    /// Workspace loads are drawn from [0, load-ceiling).
    #[arg(long, default_value_t = DEFAULT_LOAD_CEILING)]
    pub load_ceiling: u64,
}

impl From<&RealmArgs> for RealmParams {
    fn from(args: &RealmArgs) -> Self {
        RealmParams {
            nodes: args.nodes,
            workspaces: args.workspaces,
            load_ceiling: args.load_ceiling,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct StabilityArgs {
    #[command(flatten)]
    pub realm: RealmArgs,

    /// Smallest per-workspace load change.
    #[arg(long, default_value_t = -50, allow_hyphen_values = true)]
    pub min_delta: i64,

    /// Largest per-workspace load change.
    #[arg(long, default_value_t = 500, allow_hyphen_values = true)]
    pub max_delta: i64,
}

#[derive(Debug, Clone, Args)]
pub struct PerturbArgs {
    #[command(flatten)]
    pub realm: RealmArgs,

    /// Independent runs.
    #[arg(long, default_value_t = 1000)]
    pub trials: usize,
}

#[derive(Debug, Clone, Args)]
pub struct GrowArgs {
    /// Starting number of nodes.
    #[arg(long, default_value_t = 3)]
    pub nodes: usize,

    /// Starting number of workspaces.
    #[arg(long, default_value_t = 1500)]
    pub workspaces: usize,

    /// Node load that triggers adding a node.
    #[arg(long, default_value_t = DEFAULT_CAPACITY_THRESHOLD)]
    pub threshold: u64,

    /// Ids pregenerated per run.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    pub sample_size: usize,

    /// Workspace loads are drawn from [0, load-ceiling).
    #[arg(long, default_value_t = DEFAULT_LOAD_CEILING)]
    pub load_ceiling: u64,

    /// Independent runs.
    #[arg(long, default_value_t = 100)]
    pub trials: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StabilityReport {
    pub nodes: usize,
    pub workspaces: usize,
    pub initial_loads: BTreeMap<NodeId, u64>,
    pub replayed_loads: BTreeMap<NodeId, u64>,
    /// Moves when replaying unchanged loads; anything but 0 is a bug.
    pub replay_churn: usize,
    pub min_delta: i64,
    pub max_delta: i64,
    pub perturbed_churn: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerturbReport {
    pub trials: usize,
    pub nodes: usize,
    pub workspaces: usize,
    pub churn: Option<ChurnStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrowReport {
    pub trials: usize,
    pub start_nodes: usize,
    pub start_workspaces: usize,
    pub threshold: u64,
    pub churn: Option<ChurnStats>,
    pub mean_admissions: f64,
    pub mean_churn_fraction: f64,
    pub anomalies: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandResult {
    Stability(StabilityReport),
    Perturb(PerturbReport),
    Grow(GrowReport),
}

impl Command {
    pub fn execute(&self, ctx: &RunContext) -> Result<CommandResult> {
        match self {
            Command::Stability(args) => stability(args, ctx).map(CommandResult::Stability),
            Command::Perturb(args) => perturb(args, ctx).map(CommandResult::Perturb),
            Command::Grow(args) => grow(args, ctx).map(CommandResult::Grow),
        }
    }
}

fn stability(args: &StabilityArgs, ctx: &RunContext) -> Result<StabilityReport> {
    let params = RealmParams::from(&args.realm);
    let (ring, mut set, mut rng) = trials::build_realm(params, ctx.seed)?;

    let mut replayed = HashRing::with_node_count(params.nodes)?;
    let replay_churn = set.replay(&mut replayed, false).context("unchanged replay")?;

    set.perturb_loads(&mut rng, args.min_delta, args.max_delta)?;
    let mut perturbed = HashRing::with_node_count(params.nodes)?;
    let perturbed_churn = set.replay(&mut perturbed, false).context("perturbed replay")?;
    info!(replay_churn, perturbed_churn, "stability check done");

    Ok(StabilityReport {
        nodes: params.nodes,
        workspaces: params.workspaces,
        initial_loads: ring.loads(),
        replayed_loads: replayed.loads(),
        replay_churn,
        min_delta: args.min_delta,
        max_delta: args.max_delta,
        perturbed_churn,
    })
}

fn perturb(args: &PerturbArgs, ctx: &RunContext) -> Result<PerturbReport> {
    let params = RealmParams::from(&args.realm);
    let churns = trials::run_trials(args.trials, ctx.threads, ctx.seed, |seed| {
        trials::perturbation_trial(params, seed)
    })?;

    Ok(PerturbReport {
        trials: args.trials,
        nodes: params.nodes,
        workspaces: params.workspaces,
        churn: ChurnStats::from_samples(&churns),
    })
}

fn grow(args: &GrowArgs, ctx: &RunContext) -> Result<GrowReport> {
    ensure!(args.nodes > 0, "--nodes must be at least 1");
    let params = RealmParams {
        nodes: args.nodes,
        workspaces: args.workspaces,
        load_ceiling: args.load_ceiling,
    };
    let config = GrowthConfig {
        threshold: args.threshold,
        sample_size: args.sample_size,
        load_ceiling: args.load_ceiling,
        ..GrowthConfig::default()
    };

    let outcomes = trials::run_trials(args.trials, ctx.threads, ctx.seed, |seed| {
        trials::growth_trial(params, config, seed)
    })?;

    let churns: Vec<usize> = outcomes.iter().map(|o| o.churn).collect();
    let runs = outcomes.len().max(1) as f64;
    Ok(GrowReport {
        trials: args.trials,
        start_nodes: args.nodes,
        start_workspaces: args.workspaces,
        threshold: args.threshold,
        churn: ChurnStats::from_samples(&churns),
        mean_admissions: outcomes.iter().map(|o| o.admissions as f64).sum::<f64>() / runs,
        mean_churn_fraction: outcomes.iter().map(|o| o.churn_fraction()).sum::<f64>() / runs,
        anomalies: outcomes.iter().map(|o| o.anomalies.len()).sum(),
    })
}

fn write_loads(f: &mut fmt::Formatter<'_>, title: &str, loads: &BTreeMap<NodeId, u64>) -> fmt::Result {
    writeln!(f, "{title}")?;
    for (node, load) in loads {
        writeln!(f, "  {node}: {load}")?;
    }
    Ok(())
}

fn write_stats(f: &mut fmt::Formatter<'_>, stats: &Option<ChurnStats>) -> fmt::Result {
    match stats {
        Some(s) => {
            writeln!(f, "Min: {}", s.min)?;
            writeln!(f, "Max: {}", s.max)?;
            writeln!(f, "Average: {:.2}", s.mean)?;
            write!(f, "Standard Deviation: {:.2}", s.std_dev)
        }
        None => write!(f, "no trials run"),
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Stability(r) => {
                write_loads(f, "Initial load", &r.initial_loads)?;
                write_loads(f, "Replayed load", &r.replayed_loads)?;
                writeln!(f, "Unchanged replay moved {} workspaces", r.replay_churn)?;
                write!(
                    f,
                    "Load change in [{}, {}] across {} nodes and {} workspaces moved {} workspaces",
                    r.min_delta, r.max_delta, r.nodes, r.workspaces, r.perturbed_churn
                )
            }
            CommandResult::Perturb(r) => {
                writeln!(
                    f,
                    "{} load changes across {} nodes, {} workspaces",
                    r.trials, r.nodes, r.workspaces
                )?;
                write_stats(f, &r.churn)
            }
            CommandResult::Grow(r) => {
                writeln!(
                    f,
                    "Workspaces moved when node {} was added at load {}, after {:.1} admissions on average (starting with {} workspaces)",
                    r.start_nodes + 1,
                    r.threshold,
                    r.mean_admissions,
                    r.start_workspaces
                )?;
                writeln!(f, "Mean fraction moved: {:.3}", r.mean_churn_fraction)?;
                writeln!(f, "Placement anomalies: {}", r.anomalies)?;
                write_stats(f, &r.churn)
            }
        }
    }
}
