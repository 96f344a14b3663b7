//! `apply` - converge the fragment directory to the manifest

use anyhow::{Result, bail};
use std::path::Path;

use crate::Context;
use crate::engine::{ExecuteOptions, ExecutionPlan, execute};
use crate::ui;

pub struct ApplyArgs<'a> {
    pub manifest: Option<&'a Path>,
    pub conf_dir: Option<&'a Path>,
    pub target: Option<&'a str>,
    pub dry_run: bool,
    pub yes: bool,
    pub jobs: usize,
}

pub fn run(ctx: &Context, args: &ApplyArgs<'_>) -> Result<()> {
    let loaded = super::load(args.manifest, args.conf_dir)?;
    let plan =
        ExecutionPlan::from_run(&loaded.run, &loaded.conf_dir)?.filter_by_target(args.target);

    if plan.is_empty() {
        ui::info("No users to apply");
        return Ok(());
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs,
        yes: args.yes,
        verbose: ctx.verbose > 0,
    };

    let summary = execute(&plan, &opts)?;
    if !summary.is_success() {
        bail!("{} user fragments failed to apply", summary.failed);
    }
    Ok(())
}
