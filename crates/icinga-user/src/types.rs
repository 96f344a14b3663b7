//! Core types for Icinga user declarations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Desired lifecycle state of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// User must exist
    #[default]
    Present,
    /// User must not exist
    Absent,
}

impl Ensure {
    /// Value as written in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ensure::Present => "present",
            Ensure::Absent => "absent",
        }
    }

    /// Parse a manifest value. Matching is exact.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(Ensure::Present),
            "absent" => Some(Ensure::Absent),
            _ => None,
        }
    }
}

impl FromStr for Ensure {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown ensure value: {s}"))
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authentication secret.
///
/// `Debug` and `Display` are redacted so a password never ends up in a log
/// line or an error message. Use [`Password::expose`] to read it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Password(String);

impl Password {
    const REDACTED: &'static str = "********";

    pub(crate) fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for rendering only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Password").field(&Self::REDACTED).finish()
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::REDACTED)
    }
}

/// Raw, unvalidated desired-state parameters for one user.
///
/// `ensure` stays a string here so unknown values can be reported as
/// validation failures instead of parse failures.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserParams {
    /// `present` or `absent`; defaults to `present` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure: Option<String>,
    /// Credential to configure; omitted means "no credential"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserParams {
    /// Parameters for a user that must exist.
    pub fn present() -> Self {
        Self {
            ensure: Some(Ensure::Present.as_str().to_string()),
            password: None,
        }
    }

    /// Parameters for a user that must be removed.
    pub fn absent() -> Self {
        Self {
            ensure: Some(Ensure::Absent.as_str().to_string()),
            password: None,
        }
    }

    /// Set the ensure value verbatim.
    pub fn with_ensure(mut self, ensure: impl Into<String>) -> Self {
        self.ensure = Some(ensure.into());
        self
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// BLAKE3 digest of the parameters exactly as supplied.
    ///
    /// An omitted `ensure` differs from an explicit `present`, and a password
    /// counts even when the resulting entity drops it.
    pub fn fingerprint(&self) -> blake3::Hash {
        hash_fields(&[self.ensure.as_deref(), self.password.as_deref()])
    }
}

/// Hash optional fields, tagged and length-prefixed so no two field lists
/// collide.
pub(crate) fn hash_fields(fields: &[Option<&str>]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for field in fields {
        match field {
            None => {
                hasher.update(&[0]);
            }
            Some(value) => {
                hasher.update(&[1]);
                hasher.update(&(value.len() as u64).to_le_bytes());
                hasher.update(value.as_bytes());
            }
        }
    }
    hasher.finalize()
}

impl fmt::Debug for UserParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserParams")
            .field("ensure", &self.ensure)
            .field("password", &self.password.as_ref().map(|_| Password::REDACTED))
            .finish()
    }
}

/// The canonical, validated representation of one monitored user.
///
/// Entities are immutable once resolved. Only a run can create them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    identifier: String,
    ensure: Ensure,
    password: Option<Password>,
    order: usize,
}

impl UserEntity {
    pub(crate) fn new(
        identifier: String,
        ensure: Ensure,
        password: Option<Password>,
        order: usize,
    ) -> Self {
        // Credentials only mean something for a user that exists
        let password = match ensure {
            Ensure::Present => password,
            Ensure::Absent => None,
        };
        Self {
            identifier,
            ensure,
            password,
            order,
        }
    }

    /// Unique key of this user within its run.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Desired lifecycle state.
    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    /// Credential to configure, if any. Always `None` for absent users.
    pub fn password(&self) -> Option<&Password> {
        self.password.as_ref()
    }

    /// Whether this entity carries credential material.
    pub fn has_credential(&self) -> bool {
        self.password.is_some()
    }

    /// Position in declaration order (first resolution wins).
    pub fn order(&self) -> usize {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_parse() {
        assert_eq!(Ensure::parse("present"), Some(Ensure::Present));
        assert_eq!(Ensure::parse("absent"), Some(Ensure::Absent));
        assert_eq!(Ensure::parse("Present"), None);
        assert_eq!(Ensure::parse("maybe"), None);
        assert_eq!("absent".parse::<Ensure>(), Ok(Ensure::Absent));
    }

    #[test]
    fn test_ensure_default_is_present() {
        assert_eq!(Ensure::default(), Ensure::Present);
        assert_eq!(Ensure::Present.to_string(), "present");
    }

    #[test]
    fn test_password_is_redacted() {
        let pw = Password::new("hunter2");
        assert_eq!(pw.expose(), "hunter2");
        assert!(!format!("{pw:?}").contains("hunter2"));
        assert!(!pw.to_string().contains("hunter2"));
    }

    #[test]
    fn test_params_debug_is_redacted() {
        let params = UserParams::present().with_password("hunter2");
        let debug = format!("{params:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("present"));
    }

    #[test]
    fn test_absent_entity_drops_password() {
        let entity = UserEntity::new(
            "u".to_string(),
            Ensure::Absent,
            Some(Password::new("x")),
            0,
        );
        assert!(entity.password().is_none());
        assert!(!entity.has_credential());
    }

    #[test]
    fn test_params_fingerprint_tracks_raw_input() {
        let base = UserParams::absent().with_password("a");
        assert_eq!(base.fingerprint(), base.clone().fingerprint());
        assert_ne!(
            base.fingerprint(),
            UserParams::absent().with_password("b").fingerprint()
        );
        assert_ne!(
            UserParams::default().fingerprint(),
            UserParams::present().fingerprint()
        );
        // Field boundaries matter
        assert_ne!(
            UserParams::default().with_ensure("ab").fingerprint(),
            UserParams::default().with_ensure("a").with_password("b").fingerprint()
        );
    }

    #[test]
    fn test_params_reject_unknown_fields() {
        let result: std::result::Result<UserParams, _> =
            serde_json::from_str(r#"{"ensure":"present","email":"a@b"}"#);
        assert!(result.is_err());
    }
}
