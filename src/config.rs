//! Users manifest: the list of users to manage, in declaration order.
//!
//! ```toml
//! [settings]
//! conf_dir = "/etc/icinga2/conf.d/users"
//!
//! [[user]]
//! name = "dummyuser2"
//! ensure = "present"
//! password = "default"
//! ```
//!
//! JSON manifests use the same shape (`{"settings": {...}, "user": [...]}`).

use anyhow::{Context, Result, bail};
use icinga_user::{ConvergenceRun, UserParams, ValidationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Supported manifest formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick a format from the file extension (TOML unless `.json`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Top-level manifest
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub settings: Settings,

    /// Users in declaration order
    #[serde(default, rename = "user")]
    pub users: Vec<UserEntry>,
}

/// Run-wide settings
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory the fragments are written to
    #[serde(default)]
    pub conf_dir: Option<String>,
}

/// One `[[user]]` entry
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserEntry {
    /// Raw parameters for the resolver
    pub fn params(&self) -> UserParams {
        UserParams {
            ensure: self.ensure.clone(),
            password: self.password.clone(),
        }
    }
}

impl Manifest {
    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "Manifest not found: {} (pass --manifest or create it)",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest: {}", path.display()))?;

        let manifest = Self::parse(&content, ConfigFormat::from_path(path))
            .with_context(|| format!("Invalid manifest: {}", path.display()))?;

        log::info!(
            "Loaded {} user entries from {}",
            manifest.users.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Parse manifest text
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).context("Invalid TOML format"),
            ConfigFormat::Json => serde_json::from_str(content).context("Invalid JSON format"),
        }
    }

    /// Resolve every entry into a fresh run, in file order.
    ///
    /// All validation failures are returned together so one bad entry does
    /// not hide the rest.
    pub fn resolve(&self) -> std::result::Result<ConvergenceRun, Vec<ValidationError>> {
        let params: Vec<UserParams> = self.users.iter().map(UserEntry::params).collect();
        let mut run = ConvergenceRun::new();
        let errors = run.resolve_all(
            self.users
                .iter()
                .zip(&params)
                .map(|(u, p)| (u.name.as_str(), p)),
        );

        if errors.is_empty() {
            Ok(run)
        } else {
            Err(errors)
        }
    }
}

/// Resolve a manifest, turning validation failures into one readable error
pub fn resolve_or_report(manifest: &Manifest) -> Result<ConvergenceRun> {
    manifest.resolve().map_err(|errors| {
        for err in &errors {
            log::error!("{err}");
        }
        let details: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        anyhow::anyhow!(
            "{} invalid user declaration(s):\n{}",
            errors.len(),
            details.join("\n")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use icinga_user::Ensure;

    const SAMPLE: &str = r#"
[settings]
conf_dir = "/tmp/users"

[[user]]
name = "dummyuser1"
ensure = "present"

[[user]]
name = "dummyuser2"
ensure = "present"
password = "default"
"#;

    #[test]
    fn test_parse_toml() {
        let manifest = Manifest::parse(SAMPLE, ConfigFormat::Toml).unwrap();
        assert_eq!(manifest.settings.conf_dir.as_deref(), Some("/tmp/users"));
        assert_eq!(manifest.users.len(), 2);
        assert_eq!(manifest.users[1].name, "dummyuser2");
        assert_eq!(manifest.users[1].password.as_deref(), Some("default"));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"user": [{"name": "a"}, {"name": "b", "ensure": "absent"}]}"#;
        let manifest = Manifest::parse(json, ConfigFormat::Json).unwrap();
        assert!(manifest.settings.conf_dir.is_none());
        assert_eq!(manifest.users.len(), 2);
        assert!(manifest.users[0].ensure.is_none());
    }

    #[test]
    fn test_unknown_user_key_rejected() {
        let toml = r#"
[[user]]
name = "a"
email = "a@example.com"
"#;
        assert!(Manifest::parse(toml, ConfigFormat::Toml).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("users.JSON")),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("users.toml")),
            ConfigFormat::Toml
        );
        assert_eq!(ConfigFormat::from_path(Path::new("users")), ConfigFormat::Toml);
    }

    #[test]
    fn test_resolve_keeps_order() {
        let manifest = Manifest::parse(SAMPLE, ConfigFormat::Toml).unwrap();
        let run = manifest.resolve().unwrap();
        let ids: Vec<_> = run.entities().map(|e| e.identifier()).collect();
        assert_eq!(ids, ["dummyuser1", "dummyuser2"]);
        assert_eq!(run.get("dummyuser1").unwrap().ensure(), Ensure::Present);
    }

    #[test]
    fn test_resolve_reports_all_errors() {
        let toml = r#"
[[user]]
name = "u"
ensure = "maybe"

[[user]]
name = "v"
password = ""

[[user]]
name = "ok"
"#;
        let manifest = Manifest::parse(toml, ConfigFormat::Toml).unwrap();
        let errors = manifest.resolve().unwrap_err();
        assert_eq!(errors.len(), 2);

        let err = resolve_or_report(&manifest).unwrap_err();
        assert!(err.to_string().starts_with("2 invalid user declaration(s)"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Manifest not found"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.toml");
        fs::write(&path, SAMPLE).unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.users.len(), 2);
    }
}
