use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use canonry_gate::{
    exit_code, git_head, render_block, render_markdown, run_gates, write_report, GateOptions,
};
use canonry_registry::run_registration;
use canonry_types::WorkspaceLayout;

const GIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "canonry")]
#[command(about = "Content-addressed artifact registry and lifecycle resume gates")]
#[command(version)]
struct Cli {
    /// Workspace root holding the canon and ledger directories
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register canon artifacts into the registry ledger
    Register {
        /// Compute registrations but do not write the registry
        #[arg(long)]
        dry_run: bool,

        /// Path to the registration config JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Evaluate resume gates and emit a completeness report
    Gates {
        /// Write a Markdown report to a timestamped path under the
        /// reports directory
        #[arg(long)]
        report: bool,

        /// Print the machine-readable report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Print one compact orchestration status block
        #[arg(long)]
        block: bool,

        /// Lifecycle id the workspace is expected to be on
        #[arg(long)]
        expect_lifecycle: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "canonry=info,warn".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = WorkspaceLayout::new(cli.root);

    match cli.command {
        Commands::Register { dry_run, config } => register(&layout, dry_run, config.as_deref()),
        Commands::Gates {
            report,
            json,
            block,
            expect_lifecycle,
        } => gates(&layout, report, json, block, expect_lifecycle),
    }
}

/// Best-effort reporting tool: per-artifact failures are printed and the
/// command still exits 0. Only environment/schema failures propagate.
fn register(
    layout: &WorkspaceLayout,
    dry_run: bool,
    config: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let summary = run_registration(layout, config, dry_run)
        .with_context(|| format!("registration failed in {}", layout.root().display()))?;

    if dry_run {
        println!("dry_run: true");
        println!("artifact_count: {}", summary.artifact_count);
        println!("new_decision_count: {}", summary.new_decision_ids.len());
    }
    if summary.new_decision_ids.is_empty() {
        println!("new_decision_ids: none");
    } else {
        println!("new_decision_ids:");
        for id in &summary.new_decision_ids {
            println!("{id}");
        }
    }
    for skip in &summary.skipped {
        eprintln!("skipped: {} ({})", skip.path, skip.reason);
    }
    Ok(())
}

fn gates(
    layout: &WorkspaceLayout,
    report: bool,
    json: bool,
    block: bool,
    expect_lifecycle: Option<String>,
) -> anyhow::Result<()> {
    let options = GateOptions {
        config_path: None,
        expected_lifecycle_id: expect_lifecycle,
    };
    let result = run_gates(layout, &options);

    let mut report_path: Option<PathBuf> = None;
    if report {
        let path = write_report(layout, &result).context("failed to write completeness report")?;
        if !json && !block {
            eprintln!("wrote {}", path.display());
        }
        report_path = Some(path);
    }

    if block {
        let commit = git_head(layout.root(), GIT_TIMEOUT);
        let rel = report_path
            .as_deref()
            .map(|p| canonry_gate::orchestrator::report_rel(layout, p))
            .unwrap_or_default();
        println!("{}", render_block(&result, &commit, &rel));
    } else if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_markdown(&result));
    }

    std::process::exit(exit_code(&result));
}
