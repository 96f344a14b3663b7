//! `validate` - resolve the manifest without touching the filesystem

use anyhow::{Result, bail};
use colored::Colorize;
use std::path::Path;

use crate::Context;
use crate::config::Manifest;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, manifest_flag: Option<&Path>) -> Result<()> {
    let path = paths::manifest_path(manifest_flag)?;
    let manifest = Manifest::load(&path)?;

    match manifest.resolve() {
        Ok(run) => {
            if !ctx.quiet {
                ui::header(&format!("Users in {}", path.display()));
                for entity in run.entities() {
                    let credential = if entity.has_credential() {
                        " [password]".dimmed().to_string()
                    } else {
                        String::new()
                    };
                    println!(
                        "  {} {:<30} {}{}",
                        "✓".green(),
                        entity.identifier(),
                        entity.ensure(),
                        credential
                    );
                }
                println!();
            }
            ui::success(&format!("{} users valid", run.len()));
            Ok(())
        }
        Err(errors) => {
            for err in &errors {
                ui::error(&format!("{} ({})", err, err.kind()));
            }
            bail!(
                "{} of {} user declarations are invalid",
                errors.len(),
                manifest.users.len()
            )
        }
    }
}
