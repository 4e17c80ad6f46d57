//! `drift pull [PATH]`: apply the pending change list under a path.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use drift_core::{Change, Operation};
use drift_sync::{
    AlwaysConfirm, Confirm, DirStore, PlanResolver, ProgressSink, PullOrchestrator, PullOutcome,
};

use super::{current_context, remote_root};

/// Arguments for `drift pull`.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Logical path to pull, relative to the context root (default: everything).
    #[arg(default_value = "")]
    pub path: String,

    /// Plan file holding the change list (default: `.drift/plan.json`).
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Apply without asking for confirmation.
    #[arg(long, short = 'y')]
    pub no_prompt: bool,

    /// List the changes that would be applied and stop.
    #[arg(long)]
    pub dry_run: bool,

    /// Override the configured window size.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,
}

impl PullArgs {
    pub fn run(self) -> Result<()> {
        let ctx = current_context()?;
        let plan = self.plan.clone().unwrap_or_else(|| ctx.plan_path());
        let window = self.jobs.unwrap_or(ctx.config().concurrency);
        let store = DirStore::open(remote_root(&ctx));

        let confirm: Arc<dyn Confirm> = if self.no_prompt {
            Arc::new(AlwaysConfirm)
        } else {
            Arc::new(TerminalConfirm)
        };

        let cancel = CancellationToken::new();
        let orchestrator = PullOrchestrator::new(
            ctx,
            Arc::new(store),
            Arc::new(PlanResolver::new(plan)),
        )
        .with_window(window)
        .with_confirm(confirm)
        .with_progress(Arc::new(BarProgress::new()))
        .with_cancel(cancel.clone())
        .with_dry_run(self.dry_run);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start runtime")?;

        println!("Resolving...");
        let outcome = runtime.block_on(async {
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received; finishing in-flight changes");
                    cancel.cancel();
                }
            });
            orchestrator.pull(&self.path).await
        });
        let outcome =
            outcome.with_context(|| format!("pull of '{}' failed", display_path(&self.path)))?;

        print_outcome(&self.path, outcome);
        Ok(())
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

fn print_outcome(path: &str, outcome: PullOutcome) {
    match outcome {
        PullOutcome::NothingToPull => {
            println!("✓ Nothing to pull at '{}'", display_path(path));
        }
        PullOutcome::WouldApply { changes } => {
            print_changes(&changes);
            println!("[dry-run] {} change(s) would be applied", changes.len());
        }
        PullOutcome::Declined { pending } => {
            println!("Pull aborted; {pending} change(s) not applied");
        }
        PullOutcome::Applied(report) => {
            println!(
                "✓ Applied {} change(s) in {} window(s)",
                report.applied.len(),
                report.windows.len()
            );
        }
    }
}

fn print_changes(changes: &[Change]) {
    for change in changes {
        let marker = match change.operation {
            Operation::Add => "+".green(),
            Operation::Modify => "~".yellow(),
            Operation::Delete => "-".red(),
        };
        println!("  {marker} {}", change.path);
    }
}

/// Lists the changes and asks on stdin. Anything but `y`/`yes` declines.
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, changes: &[Change]) -> bool {
        print_changes(changes);
        print!("Apply {} change(s)? [y/N] ", changes.len());
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Renders executor progress as a terminal bar.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressSink for BarProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} changes") {
            self.bar.set_style(style);
        }
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn advanced(&self, remaining: usize, total: usize) {
        self.bar.set_position(total.saturating_sub(remaining) as u64);
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}
