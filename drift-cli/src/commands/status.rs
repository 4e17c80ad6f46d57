//! `drift status`: show the governing context and its pending plan.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use drift_sync::PlanResolver;

use super::{current_context, remote_root};

/// Arguments for `drift status`.
#[derive(Args, Debug)]
pub struct StatusArgs {}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let ctx = current_context()?;
        let plan = PlanResolver::new(ctx.plan_path());

        println!("{} {}", "root:  ".bold(), ctx.root().display());
        println!("{} {}", "remote:".bold(), remote_root(&ctx).display());
        println!("{} {}", "window:".bold(), ctx.config().concurrency);

        if !plan.plan_path().exists() {
            println!("{} none", "plan:  ".bold());
            return Ok(());
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start runtime")?;
        let changes = runtime
            .block_on(plan.load())
            .with_context(|| format!("cannot read plan '{}'", plan.plan_path().display()))?;
        println!(
            "{} {} pending change(s) in {}",
            "plan:  ".bold(),
            changes.len(),
            plan.plan_path().display()
        );
        Ok(())
    }
}
