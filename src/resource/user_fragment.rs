//! User fragment resource - one Icinga 2 config file per declared user

use anyhow::{Context, Result};
use icinga_user::{Declaration, Ensure};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{ApplyContext, ApplyResult, Resource, ResourceState};

/// File mode for fragments that carry a password
#[cfg(unix)]
const CREDENTIAL_MODE: u32 = 0o600;

/// File mode for everything else
#[cfg(unix)]
const PLAIN_MODE: u32 = 0o644;

/// A declaration materialized as `<conf_dir>/user_<id>.conf`
#[derive(Debug, Clone)]
pub struct UserFragment {
    declaration: Declaration,
    path: PathBuf,
}

#[derive(Debug)]
enum FragmentState {
    Missing,
    Matches,
    Differs(String),
    NotAFile,
}

impl UserFragment {
    pub fn new(declaration: Declaration, conf_dir: &Path) -> Self {
        let path = conf_dir.join(declaration.file_name());
        Self { declaration, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rendered(&self) -> Option<String> {
        self.declaration.render()
    }

    fn check_current(&self) -> Result<FragmentState> {
        if !self.path.exists() {
            return Ok(FragmentState::Missing);
        }
        if !self.path.is_file() {
            return Ok(FragmentState::NotAFile);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read fragment: {}", self.path.display()))?;

        match self.rendered() {
            Some(desired) if desired == content => Ok(FragmentState::Matches),
            _ => Ok(FragmentState::Differs(content)),
        }
    }

    /// Write through a sibling temp file that already has its final mode,
    /// then rename it over the fragment
    fn write_fragment(&self, content: &str) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create fragment directory: {}", parent.display())
        })?;

        // Created 0600 on unix; the name never matches a fragment
        let mut staged = tempfile::Builder::new()
            .prefix(".user_")
            .suffix(".tmp")
            .tempfile_in(parent)
            .with_context(|| format!("Failed to stage fragment in {}", parent.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = if self.declaration.password.is_some() {
                CREDENTIAL_MODE
            } else {
                PLAIN_MODE
            };
            fs::set_permissions(staged.path(), fs::Permissions::from_mode(mode)).with_context(
                || format!("Failed to set permissions on {}", staged.path().display()),
            )?;
        }

        staged
            .write_all(content.as_bytes())
            .with_context(|| format!("Failed to write fragment: {}", self.path.display()))?;
        staged
            .as_file()
            .sync_all()
            .with_context(|| format!("Failed to sync fragment: {}", self.path.display()))?;
        staged
            .persist(&self.path)
            .with_context(|| format!("Failed to replace fragment: {}", self.path.display()))?;

        Ok(())
    }
}

/// Short content digest; shown instead of content so passwords stay hidden
fn digest(content: &str) -> String {
    let hex = blake3::hash(content.as_bytes()).to_hex();
    format!("blake3:{}", &hex.as_str()[..12])
}

impl Resource for UserFragment {
    fn id(&self) -> String {
        self.declaration.identifier.clone()
    }

    fn description(&self) -> String {
        match self.declaration.ensure {
            Ensure::Present => format!("Icinga user {} at {}", self.id(), self.path().display()),
            Ensure::Absent => format!("Remove Icinga user {}", self.id()),
        }
    }

    fn current_state(&self) -> Result<ResourceState> {
        match self.check_current()? {
            FragmentState::Missing => Ok(ResourceState::Absent),
            FragmentState::Matches => Ok(self.desired_state()),
            FragmentState::Differs(current) => match self.rendered() {
                Some(desired) => Ok(ResourceState::Modified {
                    from: digest(&current),
                    to: digest(&desired),
                }),
                None => Ok(ResourceState::Present {
                    details: Some(digest(&current)),
                }),
            },
            FragmentState::NotAFile => Ok(ResourceState::Unknown),
        }
    }

    fn desired_state(&self) -> ResourceState {
        match self.rendered() {
            Some(content) => ResourceState::Present {
                details: Some(digest(&content)),
            },
            None => ResourceState::Absent,
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let state = self.check_current()?;
        match (self.rendered(), state) {
            (_, FragmentState::NotAFile) => Ok(ApplyResult::Skipped {
                reason: format!("Not a regular file: {}", self.path.display()),
            }),
            (Some(_), FragmentState::Matches) | (None, FragmentState::Missing) => {
                Ok(ApplyResult::NoChange)
            }
            (Some(content), FragmentState::Missing) => {
                self.write_fragment(&content)?;
                if ctx.verbose {
                    log::info!("Created {}", self.path.display());
                }
                Ok(ApplyResult::Created)
            }
            (Some(content), FragmentState::Differs(_)) => {
                self.write_fragment(&content)?;
                if ctx.verbose {
                    log::info!("Updated {}", self.path.display());
                }
                Ok(ApplyResult::Modified)
            }
            (None, FragmentState::Matches | FragmentState::Differs(_)) => {
                fs::remove_file(&self.path).with_context(|| {
                    format!("Failed to remove fragment: {}", self.path.display())
                })?;
                if ctx.verbose {
                    log::info!("Removed {}", self.path.display());
                }
                Ok(ApplyResult::Removed)
            }
        }
    }

    fn desired_content(&self) -> Option<String> {
        self.rendered()
    }

    fn current_content(&self) -> Option<String> {
        match self.check_current().ok()? {
            FragmentState::Differs(content) => Some(content),
            FragmentState::Matches => self.rendered(),
            FragmentState::Missing | FragmentState::NotAFile => None,
        }
    }
}
