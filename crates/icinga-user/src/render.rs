//! Declarations and their Icinga 2 configuration fragments.

use crate::types::{Ensure, UserEntity, hash_fields};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of every fragment file managed by this crate.
pub const FRAGMENT_PREFIX: &str = "user_";

/// Extension of every fragment file managed by this crate.
pub const FRAGMENT_EXTENSION: &str = "conf";

/// What the engine receives for one resolved user.
///
/// The password is carried verbatim; absent declarations never have one,
/// and it is skipped when serializing so no credential key appears at all.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub identifier: String,
    pub ensure: Ensure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl From<&UserEntity> for Declaration {
    fn from(entity: &UserEntity) -> Self {
        Self {
            identifier: entity.identifier().to_string(),
            ensure: entity.ensure(),
            password: entity.password().map(|p| p.expose().to_string()),
        }
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("identifier", &self.identifier)
            .field("ensure", &self.ensure)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

impl Declaration {
    /// BLAKE3 hex digest over identifier, ensure and password.
    ///
    /// Equal declarations always produce equal fingerprints.
    pub fn fingerprint(&self) -> String {
        hash_fields(&[
            Some(self.identifier.as_str()),
            Some(self.ensure.as_str()),
            self.password.as_deref(),
        ])
        .to_hex()
        .to_string()
    }

    /// Name of the fragment file for this declaration.
    pub fn file_name(&self) -> String {
        fragment_file_name(&self.identifier)
    }

    /// Render the Icinga 2 fragment, or `None` when the user is absent.
    pub fn render(&self) -> Option<String> {
        render_fragment(self)
    }
}

/// Render a present declaration as an Icinga 2 `User` object.
pub fn render_fragment(decl: &Declaration) -> Option<String> {
    if decl.ensure == Ensure::Absent {
        return None;
    }

    let name = escape(&decl.identifier);
    let mut out = String::new();
    out.push_str(&format!("object User \"{name}\" {{\n"));
    out.push_str(&format!("  display_name = \"{name}\"\n"));
    if let Some(password) = &decl.password {
        out.push_str(&format!("  vars.password = \"{}\"\n", escape(password)));
    }
    out.push_str("}\n");
    Some(out)
}

/// File name for an identifier: `user_<id>.conf` with unsafe characters
/// replaced by `_`.
pub fn fragment_file_name(identifier: &str) -> String {
    let sanitized: String = identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{FRAGMENT_PREFIX}{sanitized}.{FRAGMENT_EXTENSION}")
}

/// Whether a file name looks like one of our fragments.
pub fn is_fragment_file_name(name: &str) -> bool {
    name.starts_with(FRAGMENT_PREFIX)
        && name
            .strip_suffix(FRAGMENT_EXTENSION)
            .is_some_and(|stem| stem.ends_with('.') && stem.len() > FRAGMENT_PREFIX.len() + 1)
}

/// Escape a value for an Icinga 2 DSL string literal.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // `$name$` is macro syntax inside Icinga strings
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}
