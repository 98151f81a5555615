//! Monoship - monorepo change propagation and deployment
//!
//! Usage:
//!   monoship run                    # Build, push and deploy for the PR in GITHUB_EVENT_PATH
//!   monoship run --changed api      # Same, for explicit package directories
//!   monoship plan --changed shared  # Show what a change set would rebuild
//!   monoship graph                  # Show the package dependency graph

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monoship_core::commands::{
    ChangeSource, GraphCommand, GraphReport, PlanCommand, RunCommand, RunContext,
};
use monoship_core::deploy::DeployOutcome;
use monoship_core::orchestration::{PlanReport, RunReport};

#[derive(Parser)]
#[command(name = "monoship")]
#[command(about = "Build, push and deploy the packages a change touches", long_about = None)]
struct Cli {
    /// Repository root (defaults to the current directory)
    #[arg(long, short = 'C', global = true)]
    root: Option<PathBuf>,

    /// Path to monoship.toml (defaults to <root>/monoship.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild, push and deploy every package impacted by a change
    Run {
        #[command(flatten)]
        changes: ChangeArgs,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show which packages a change would rebuild, without side effects
    Plan {
        #[command(flatten)]
        changes: ChangeArgs,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the package dependency graph
    Graph {
        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct ChangeArgs {
    /// Changed package directory (repeatable)
    ///
    /// When omitted, changed packages are read from the pull request
    /// described by --event or GITHUB_EVENT_PATH.
    #[arg(long = "changed", value_name = "DIR")]
    changed: Vec<String>,

    /// Pull request event payload
    #[arg(long, value_name = "PATH", conflicts_with = "changed")]
    event: Option<PathBuf>,
}

impl ChangeArgs {
    fn source(&self) -> ChangeSource {
        if !self.changed.is_empty() {
            ChangeSource::Dirs(self.changed.iter().cloned().collect::<BTreeSet<_>>())
        } else if let Some(path) = &self.event {
            ChangeSource::Event(path.clone())
        } else {
            ChangeSource::Configured
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "monoship=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run_cli(cli) {
        eprintln!("{} {:#}", style("error:").red().bold(), err);
        std::process::exit(1);
    }

    Ok(())
}

fn load_context(cli: &Cli) -> Result<RunContext> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    tracing::debug!(root = %root.display(), "Loading configuration");
    RunContext::load(root, cli.config.clone())
}

fn run_cli(cli: Cli) -> Result<()> {
    let ctx = load_context(&cli)?;
    match cli.command {
        Commands::Run { changes, format } => {
            let report = RunCommand::new(ctx).execute(&changes.source())?;
            match format {
                OutputFormat::Table => print_run_table(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Plan { changes, format } => {
            let report = PlanCommand::new(ctx).execute(&changes.source())?;
            match format {
                OutputFormat::Table => print_plan_table(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Graph { format } => {
            let report = GraphCommand::new(ctx).execute()?;
            match format {
                OutputFormat::Table => print_graph_table(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
    }
    Ok(())
}

fn join(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        "-".to_string()
    } else {
        set.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn print_plan_table(report: &PlanReport) {
    println!("  {:<10} {}", style("Changed").bold(), join(&report.changed));
    println!("  {:<10} {}", style("Impacted").bold(), join(&report.impacted));
    println!("  {:<10} {}", style("Rebuild").bold(), join(&report.buildable));
}

fn print_run_table(report: &RunReport) {
    print_plan_table(&report.plan);
    println!();

    if report.images.is_empty() {
        println!("  Nothing to rebuild.");
        return;
    }

    println!("  {:<20} Image", "Package");
    println!("  {}", "-".repeat(60));
    for (dir, image) in &report.images {
        println!("  {:<20} {}", truncate(dir, 20), image);
    }

    match &report.deploy {
        Some(DeployOutcome::Completed(deploy)) => {
            println!();
            println!("  {:<20} {:<20} Action", "Package", "Service");
            println!("  {}", "-".repeat(60));
            for service in &deploy.deployed {
                println!(
                    "  {:<20} {:<20} {}",
                    truncate(&service.dir, 20),
                    truncate(&service.service, 20),
                    style(format!("{:?}", service.action).to_lowercase()).green()
                );
            }
        }
        Some(DeployOutcome::Disabled) => {
            println!();
            println!("  {}", style("Remote deployment not configured.").dim());
        }
        None => {}
    }
}

fn print_graph_table(report: &GraphReport) {
    if report.packages.is_empty() {
        println!("  No packages found.");
        return;
    }

    println!(
        "  {:<16} {:<24} {:<6} {:<24} Dependents",
        "Dir", "Name", "Build", "Depends on"
    );
    println!("  {}", "-".repeat(90));
    for entry in &report.packages {
        let build = if entry.buildable {
            style("yes").green()
        } else {
            style("no").dim()
        };
        println!(
            "  {:<16} {:<24} {:<6} {:<24} {}",
            truncate(&entry.dir, 16),
            truncate(&entry.name, 24),
            build,
            truncate(&join(&entry.parents), 24),
            join(&entry.children)
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
