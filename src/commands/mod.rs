//! Command implementations
//!
//! - `validate` - Resolve the manifest and report every invalid declaration
//! - `render` - Print declarations or rendered fragments
//! - `diff` - Preview what apply would change
//! - `apply` - Converge the fragment directory
//! - `status` - Show managed and unmanaged fragments

pub mod apply;
pub mod diff;
pub mod render;
pub mod status;
pub mod validate;

use anyhow::Result;
use icinga_user::ConvergenceRun;
use std::path::{Path, PathBuf};

use crate::config::{self, Manifest};
use crate::paths;

/// A manifest resolved into a run, plus where its fragments live
pub struct Loaded {
    pub manifest: Manifest,
    pub run: ConvergenceRun,
    pub conf_dir: PathBuf,
}

/// Load the manifest, resolve it, and work out the fragment directory
pub fn load(manifest_flag: Option<&Path>, conf_dir_flag: Option<&Path>) -> Result<Loaded> {
    let path = paths::manifest_path(manifest_flag)?;
    let manifest = Manifest::load(&path)?;
    let run = config::resolve_or_report(&manifest)?;
    let conf_dir = paths::conf_dir(conf_dir_flag, manifest.settings.conf_dir.as_deref());

    Ok(Loaded {
        manifest,
        run,
        conf_dir,
    })
}
