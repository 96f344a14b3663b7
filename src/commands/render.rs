//! `render` - print what the engine would receive

use anyhow::{Context as AnyhowContext, Result, bail};
use icinga_user::{Declaration, Ensure};
use serde::Serialize;
use std::path::Path;

use crate::Context;

const MASK: &str = "********";

/// JSON shape of one declaration; the fingerprint covers the real password
#[derive(Debug, Serialize)]
struct RenderedDeclaration {
    #[serde(flatten)]
    declaration: Declaration,
    fingerprint: String,
}

pub fn run(
    _ctx: &Context,
    manifest_flag: Option<&Path>,
    user: Option<&str>,
    json: bool,
    show_secrets: bool,
) -> Result<()> {
    let loaded = super::load(manifest_flag, None)?;
    let mut declarations = loaded.run.declarations();

    if let Some(id) = user {
        declarations.retain(|d| d.identifier == id);
        if declarations.is_empty() {
            bail!("No user '{id}' in manifest");
        }
    }

    if json {
        let rendered = to_rendered(declarations, show_secrets);
        let out = serde_json::to_string_pretty(&rendered)
            .context("Failed to serialize declarations")?;
        println!("{out}");
        return Ok(());
    }

    if !show_secrets {
        for decl in &mut declarations {
            mask(decl);
        }
    }

    print!("{}", render_all(&declarations));
    Ok(())
}

/// Hide the password while keeping the fact that one is set
fn mask(decl: &mut Declaration) {
    if decl.password.is_some() {
        decl.password = Some(MASK.to_string());
    }
}

/// Fingerprint each declaration, then mask it unless secrets are shown
fn to_rendered(declarations: Vec<Declaration>, show_secrets: bool) -> Vec<RenderedDeclaration> {
    declarations
        .into_iter()
        .map(|mut declaration| {
            let fingerprint = declaration.fingerprint();
            if !show_secrets {
                mask(&mut declaration);
            }
            RenderedDeclaration {
                declaration,
                fingerprint,
            }
        })
        .collect()
}

/// Fragments for every declaration, each headed by its file name
fn render_all(declarations: &[Declaration]) -> String {
    let mut out = String::new();
    for decl in declarations {
        out.push_str(&format!("// {}\n", decl.file_name()));
        match (decl.ensure, decl.render()) {
            (Ensure::Present, Some(fragment)) => out.push_str(&fragment),
            _ => out.push_str("// absent: fragment will be removed\n"),
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_presence() {
        let mut decl = Declaration {
            identifier: "u".to_string(),
            ensure: Ensure::Present,
            password: Some("default".to_string()),
        };
        mask(&mut decl);
        assert_eq!(decl.password.as_deref(), Some(MASK));

        let mut none = Declaration {
            identifier: "v".to_string(),
            ensure: Ensure::Present,
            password: None,
        };
        mask(&mut none);
        assert!(none.password.is_none());
    }

    #[test]
    fn test_json_fingerprint_survives_masking() {
        let decl = Declaration {
            identifier: "dummyuser2".to_string(),
            ensure: Ensure::Present,
            password: Some("default".to_string()),
        };
        let expected = decl.fingerprint();

        let rendered = to_rendered(vec![decl], false);
        let json = serde_json::to_value(&rendered).unwrap();

        assert_eq!(json[0]["fingerprint"], expected.as_str());
        assert_eq!(json[0]["password"], MASK);
        assert_eq!(json[0]["identifier"], "dummyuser2");
    }

    #[test]
    fn test_render_all() {
        let out = render_all(&[
            Declaration {
                identifier: "dummyuser1".to_string(),
                ensure: Ensure::Present,
                password: None,
            },
            Declaration {
                identifier: "olduser".to_string(),
                ensure: Ensure::Absent,
                password: None,
            },
        ]);
        assert!(out.contains("// user_dummyuser1.conf\nobject User \"dummyuser1\""));
        assert!(out.contains("// user_olduser.conf\n// absent"));
    }
}
