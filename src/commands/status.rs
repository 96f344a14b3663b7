//! `status` - managed fragments and strays in the fragment directory

use anyhow::Result;
use colored::{ColoredString, Colorize};
use icinga_user::is_fragment_file_name;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::Context;
use crate::engine::ExecutionPlan;
use crate::resource::{Resource, ResourceState};
use crate::ui;

pub fn run(ctx: &Context, manifest_flag: Option<&Path>, conf_dir_flag: Option<&Path>) -> Result<()> {
    let loaded = super::load(manifest_flag, conf_dir_flag)?;
    let plan = ExecutionPlan::from_run(&loaded.run, &loaded.conf_dir)?;

    ui::header("Icinga Users Status");
    ui::kv("Manifest entries", &loaded.manifest.users.len().to_string());
    ui::kv("Fragment directory", &loaded.conf_dir.display().to_string());
    println!();

    let mut in_sync = 0;
    for resource in &plan.resources {
        let row = status_row(resource.as_ref());
        if row.in_sync {
            in_sync += 1;
        }
        if ctx.verbose > 0 || !row.in_sync {
            println!("  {} {:<30} {}", row.symbol, resource.id(), row.label.dimmed());
        }
    }

    let managed: HashSet<PathBuf> = plan
        .resources
        .iter()
        .map(|r| loaded.conf_dir.join(icinga_user::fragment_file_name(&r.id())))
        .collect();
    let strays = unmanaged_fragments(&loaded.conf_dir, &managed);

    println!();
    ui::success(&format!(
        "{} of {} users in sync",
        in_sync,
        plan.total_resources()
    ));

    if !strays.is_empty() {
        ui::warn(&format!(
            "{} fragment(s) not declared in the manifest:",
            strays.len()
        ));
        for path in &strays {
            ui::dim(&path.display().to_string());
        }
    }

    Ok(())
}

/// One line of the status listing
struct StatusRow {
    symbol: ColoredString,
    label: String,
    in_sync: bool,
}

fn status_row(resource: &dyn Resource) -> StatusRow {
    let (symbol, label) = match resource.needs_apply() {
        Ok(false) => {
            return StatusRow {
                symbol: "✓".green(),
                label: "in sync".to_string(),
                in_sync: true,
            };
        }
        Ok(true) => match resource.current_state() {
            Ok(ResourceState::Absent) => ("+".green(), "missing".to_string()),
            Ok(ResourceState::Unknown) => ("?".dimmed(), "not a regular file".to_string()),
            Ok(_) if resource.desired_state() == ResourceState::Absent => {
                ("-".red(), "pending removal".to_string())
            }
            Ok(_) => ("~".yellow(), "out of date".to_string()),
            Err(e) => ("✗".red(), format!("error: {e}")),
        },
        Err(e) => ("✗".red(), format!("error: {e}")),
    };
    StatusRow {
        symbol,
        label,
        in_sync: false,
    }
}

/// Fragment-looking files in `conf_dir` that no declaration owns
fn unmanaged_fragments(conf_dir: &Path, managed: &HashSet<PathBuf>) -> Vec<PathBuf> {
    let mut strays: Vec<PathBuf> = WalkDir::new(conf_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_fragment_file_name(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .filter(|p| !managed.contains(p))
        .collect();
    strays.sort();
    strays
}
