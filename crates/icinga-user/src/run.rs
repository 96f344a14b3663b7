//! Per-run registry of resolved users.
//!
//! A [`ConvergenceRun`] owns every identifier resolved so far, so duplicate
//! detection needs no global catalog. Runs share nothing; resolve users for
//! different hosts in separate runs.

use crate::error::{Result, ValidationError};
use crate::render::Declaration;
use crate::types::{Ensure, Password, UserEntity, UserParams};
use std::collections::HashMap;
use std::fmt;

/// The set of users resolved during one convergence run.
#[derive(Default)]
pub struct ConvergenceRun {
    entities: Vec<UserEntity>,
    /// Position in `entities` and fingerprint of the params that declared it
    index: HashMap<String, (usize, blake3::Hash)>,
}

// Fingerprints cover passwords, so they stay out of debug output
impl fmt::Debug for ConvergenceRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvergenceRun")
            .field("entities", &self.entities)
            .finish_non_exhaustive()
    }
}

impl ConvergenceRun {
    /// Create an empty run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `params` for `identifier` and declare the resulting user.
    ///
    /// Resolving an identifier again with identical parameters returns the
    /// existing entity. Any other repeat is a
    /// [`ValidationError::DuplicateIdentifier`]. A failed call leaves the
    /// run unchanged.
    pub fn resolve(&mut self, identifier: &str, params: &UserParams) -> Result<UserEntity> {
        let candidate = validate(identifier, params, self.entities.len())?;
        let fingerprint = params.fingerprint();

        if let Some(&(pos, declared_with)) = self.index.get(identifier) {
            if declared_with == fingerprint {
                log::debug!("user '{identifier}' already declared with identical parameters");
                return Ok(self.entities[pos].clone());
            }
            return Err(ValidationError::DuplicateIdentifier {
                identifier: identifier.to_string(),
            });
        }

        log::debug!(
            "declared user '{}' (ensure={}, credential={})",
            candidate.identifier(),
            candidate.ensure(),
            candidate.has_credential()
        );
        self.index.insert(
            candidate.identifier().to_string(),
            (self.entities.len(), fingerprint),
        );
        self.entities.push(candidate.clone());
        Ok(candidate)
    }

    /// Resolve a batch, collecting every failure instead of stopping at the
    /// first one. Successful entries stay declared.
    pub fn resolve_all<'a, I>(&mut self, entries: I) -> Vec<ValidationError>
    where
        I: IntoIterator<Item = (&'a str, &'a UserParams)>,
    {
        entries
            .into_iter()
            .filter_map(|(identifier, params)| self.resolve(identifier, params).err())
            .collect()
    }

    /// Look up a resolved user.
    pub fn get(&self, identifier: &str) -> Option<&UserEntity> {
        self.index.get(identifier).map(|&(pos, _)| &self.entities[pos])
    }

    /// Resolved users in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = &UserEntity> {
        self.entities.iter()
    }

    /// Declarations for the engine, in declaration order.
    pub fn declarations(&self) -> Vec<Declaration> {
        self.entities.iter().map(Declaration::from).collect()
    }

    /// Number of distinct users declared.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Build an entity from raw parameters, without looking at the run.
fn validate(identifier: &str, params: &UserParams, order: usize) -> Result<UserEntity> {
    if identifier.trim().is_empty() {
        return Err(ValidationError::InvalidIdentifier {
            identifier: identifier.to_string(),
        });
    }

    let ensure = match params.ensure.as_deref() {
        None => Ensure::default(),
        Some(value) => {
            Ensure::parse(value).ok_or_else(|| ValidationError::InvalidEnsureValue {
                identifier: identifier.to_string(),
                value: value.to_string(),
            })?
        }
    };

    let password = match params.password.as_deref() {
        None => None,
        Some("") => {
            return Err(ValidationError::InvalidPassword {
                identifier: identifier.to_string(),
            });
        }
        Some(secret) => Some(Password::new(secret)),
    };

    Ok(UserEntity::new(
        identifier.to_string(),
        ensure,
        password,
        order,
    ))
}
