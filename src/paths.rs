//! Path resolution for icinga-users
//!
//! # Environment Variables
//!
//! - `ICINGA_USERS_CONFIG_DIR` - Override the directory holding `users.toml`
//! - `ICINGA_USERS_MANIFEST` - Override the manifest path itself
//! - `ICINGA_USERS_CONF_DIR` - Override the Icinga directory fragments go to
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `ICINGA_USERS_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/icinga-users` (if set)
//! 3. `~/.config/icinga-users`
//!
//! For conf_dir():
//! 1. `--conf-dir` flag
//! 2. `ICINGA_USERS_CONF_DIR` environment variable
//! 3. `settings.conf_dir` from the manifest
//! 4. `/etc/icinga2/conf.d/users`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "ICINGA_USERS_CONFIG_DIR";

/// Environment variable for manifest path override
pub const ENV_MANIFEST: &str = "ICINGA_USERS_MANIFEST";

/// Environment variable for the Icinga fragment directory
pub const ENV_CONF_DIR: &str = "ICINGA_USERS_CONF_DIR";

/// Where fragments go when nothing else says otherwise
pub const DEFAULT_CONF_DIR: &str = "/etc/icinga2/conf.d/users";

const APP_DIR: &str = "icinga-users";
const MANIFEST_FILE: &str = "users.toml";

/// Get the icinga-users config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the manifest path, honouring an explicit `--manifest` first
pub fn manifest_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(&path.to_string_lossy()));
    }

    if let Ok(path) = std::env::var(ENV_MANIFEST) {
        log::debug!("Using manifest from {}: {}", ENV_MANIFEST, path);
        return Ok(expand(&path));
    }

    Ok(config_dir()?.join(MANIFEST_FILE))
}

/// Get the directory fragments are written to
pub fn conf_dir(flag: Option<&Path>, manifest_setting: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        return expand(&path.to_string_lossy());
    }

    if let Ok(dir) = std::env::var(ENV_CONF_DIR) {
        log::debug!("Using conf dir from {}: {}", ENV_CONF_DIR, dir);
        return expand(&dir);
    }

    manifest_setting.map_or_else(|| PathBuf::from(DEFAULT_CONF_DIR), expand)
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to run a test with temporary env var
    ///
    /// # Safety
    /// This function uses unsafe env::set_var/remove_var which can cause issues
    /// if other threads read environment variables concurrently.
    /// Only use in single-threaded test contexts.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/config/path", || {
            let dir = config_dir().unwrap();
            assert_eq!(dir, PathBuf::from("/custom/config/path"));
        });
    }

    #[test]
    fn test_manifest_path_explicit_wins() {
        let path = manifest_path(Some(Path::new("/srv/users.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/srv/users.json"));
    }

    #[test]
    fn test_conf_dir_flag_wins() {
        let dir = conf_dir(Some(Path::new("/tmp/flag")), Some("/tmp/setting"));
        assert_eq!(dir, PathBuf::from("/tmp/flag"));
    }

    #[test]
    fn test_conf_dir_env_beats_setting() {
        with_env_var(ENV_CONF_DIR, "/tmp/from-env", || {
            let dir = conf_dir(None, Some("/tmp/setting"));
            assert_eq!(dir, PathBuf::from("/tmp/from-env"));
        });
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand("~/users"), home.join("users"));
        }
    }

    #[test]
    fn test_expand_plain_path_unchanged() {
        assert_eq!(
            expand("/etc/icinga2/conf.d"),
            PathBuf::from("/etc/icinga2/conf.d")
        );
    }
}
