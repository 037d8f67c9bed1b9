//! nodevendor - project-local Node.js for PHP projects
//!
//! Usage:
//!   nodevendor install     # Reuse or install Node.js, write vendor/bin shims
//!   nodevendor uninstall   # Remove the local install and the shims
//!   nodevendor env         # Print the PATH export for the bin directory
//!   nodevendor resolve     # Print the merged version constraint

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nodevendor_core::constraint::merge_graph_constraints;
use nodevendor_core::installer::path::{export_line, registered_path};
use nodevendor_core::package::graph::read_root_manifest;
use nodevendor_core::prelude::*;

const ROOT_MANIFEST: &str = "composer.json";
const INSTALLED_FILE: &str = "vendor/composer/installed.json";

#[derive(Parser)]
#[command(name = "nodevendor")]
#[command(about = "Project-local Node.js runtime for Composer projects", long_about = None)]
struct Cli {
    /// Narrate each step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reuse a satisfying Node.js or install one, then write the shims
    Install(InstallArgs),

    /// Remove the local Node.js install and its shims
    #[command(alias = "rm")]
    Uninstall {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Print a shell line that puts the bin directory on PATH
    Env {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Print the version constraint merged from all packages
    Resolve {
        #[command(flatten)]
        project: ProjectArgs,
        /// Installed package list (default: <project>/vendor/composer/installed.json)
        #[arg(long)]
        installed: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ProjectArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    project: PathBuf,
    /// Directory for the node/npm shims (default: <project>/vendor/bin)
    #[arg(long)]
    bin_dir: Option<PathBuf>,
    /// Root manifest (default: <project>/composer.json)
    #[arg(long)]
    manifest: Option<PathBuf>,
}

#[derive(Args)]
struct InstallArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Installed package list (default: <project>/vendor/composer/installed.json)
    #[arg(long)]
    installed: Option<PathBuf>,
    /// Node.js distribution mirror (overrides the tool config)
    #[arg(long)]
    dist_url: Option<String>,
    /// Install locally even if a satisfying global Node.js exists
    #[arg(long)]
    force_local: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "nodevendor=info,nodevendor_core=info,warn"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let io = IoContext::new(cli.verbose);
    match cli.command {
        Commands::Install(args) => run_install(args, io),
        Commands::Uninstall { project } => run_uninstall(project, io),
        Commands::Env { project } => run_env(project),
        Commands::Resolve { project, installed } => run_resolve(project, installed),
    }
}

fn run_install(args: InstallArgs, io: IoContext) -> Result<()> {
    let mut tool_config = ToolConfig::load_default()?;
    if let Some(url) = &args.dist_url {
        tool_config = tool_config.with_dist_url(url)?;
    }
    let ctx = app_context(&args.project, tool_config, io)?;

    let graph = load_graph(&ctx, &args.project, args.installed.as_deref())?;
    let mut settings = Settings::from_root(&graph.root)?;
    if args.force_local {
        settings = settings.with_force_local(true);
    }

    let orchestrator = Orchestrator::new(ctx.collaborators(), io);
    let report = orchestrator.run(
        Mode::Install,
        &RunRequest {
            graph: &graph,
            settings: &settings,
            project_root: ctx.project_root(),
            bin_dir: ctx.bin_dir(),
        },
    )?;

    let target_dir = settings.resolve_target_dir(ctx.project_root());
    match &report.outcome {
        RunOutcome::ReusedGlobal { version } => {
            println!("Using global Node.js {}", version);
        }
        RunOutcome::ReusedLocal { version } => {
            println!(
                "Using Node.js {} from {}",
                version,
                target_dir.display()
            );
        }
        RunOutcome::InstalledLocal { version } => {
            println!(
                "Installed Node.js {} in {}",
                version,
                target_dir.display()
            );
        }
        RunOutcome::Uninstalled(_) => {}
    }

    if let Some(path) = &report.path {
        println!("{}", export_line(path));
    }
    Ok(())
}

fn run_uninstall(project: ProjectArgs, io: IoContext) -> Result<()> {
    let ctx = app_context(&project, ToolConfig::default(), io)?;

    // The manifest may already be gone when the host removes us.
    let manifest = manifest_path(&ctx, &project);
    let root = if manifest.exists() {
        read_root_manifest(&manifest).unwrap_or_else(|e| {
            tracing::warn!("{:#}; removing with default settings", e);
            CompletePackage::new("__root__")
        })
    } else {
        CompletePackage::new("__root__")
    };
    let settings = Settings::for_uninstall(&root);
    let graph = PackageGraph::new(root, Vec::new());

    let orchestrator = Orchestrator::new(ctx.collaborators(), io);
    let report = orchestrator.run(
        Mode::Uninstall,
        &RunRequest {
            graph: &graph,
            settings: &settings,
            project_root: ctx.project_root(),
            bin_dir: ctx.bin_dir(),
        },
    )?;

    if let RunOutcome::Uninstalled(removed) = &report.outcome {
        let target_dir = settings.resolve_target_dir(ctx.project_root());
        if removed.removed_target {
            println!("Removed {}", target_dir.display());
        }
        if let Some(parent) = &removed.removed_parent {
            println!("Removed empty {}", parent.display());
        }
        for shim in &removed.removed_shims {
            println!("Removed {}", shim.display());
        }
    }
    Ok(())
}

fn run_env(project: ProjectArgs) -> Result<()> {
    let ctx = app_context(&project, ToolConfig::default(), IoContext::default())?;
    let path = registered_path(ctx.bin_dir())?;
    println!("{}", export_line(&path));
    Ok(())
}

fn run_resolve(project: ProjectArgs, installed: Option<PathBuf>) -> Result<()> {
    let ctx = app_context(&project, ToolConfig::default(), IoContext::default())?;
    let graph = load_graph(&ctx, &project, installed.as_deref())?;
    println!("{}", merge_graph_constraints(&graph));
    Ok(())
}

fn app_context(project: &ProjectArgs, tool_config: ToolConfig, io: IoContext) -> Result<AppContext> {
    let project_root = std::path::absolute(&project.project)
        .with_context(|| format!("Invalid project directory: {}", project.project.display()))?;
    let mut ctx = AppContext::new(project_root, tool_config, io);
    if let Some(bin_dir) = &project.bin_dir {
        ctx = ctx.with_bin_dir(bin_dir.clone());
    }
    Ok(ctx)
}

fn manifest_path(ctx: &AppContext, project: &ProjectArgs) -> PathBuf {
    match &project.manifest {
        Some(path) => ctx.resolve(path),
        None => ctx.project_root().join(ROOT_MANIFEST),
    }
}

fn load_graph(ctx: &AppContext, project: &ProjectArgs, installed: Option<&Path>) -> Result<PackageGraph> {
    let manifest = manifest_path(ctx, project);
    let installed = match installed {
        Some(path) => ctx.resolve(path),
        None => ctx.project_root().join(INSTALLED_FILE),
    };
    PackageGraph::load(&manifest, Some(&installed))
}
