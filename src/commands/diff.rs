//! `diff` - preview what apply would change

use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::engine::ExecutionPlan;
use crate::engine::differ::{compute_diffs, display_content_diffs, display_diff};

pub fn run(
    ctx: &Context,
    manifest_flag: Option<&Path>,
    conf_dir_flag: Option<&Path>,
    target: Option<&str>,
) -> Result<()> {
    let loaded = super::load(manifest_flag, conf_dir_flag)?;
    let plan = ExecutionPlan::from_run(&loaded.run, &loaded.conf_dir)?.filter_by_target(target);

    let diffs = compute_diffs(&plan.resources);
    display_diff(&diffs);

    if ctx.verbose > 0 && !diffs.is_empty() {
        display_content_diffs(&plan.resources);
    }

    Ok(())
}
