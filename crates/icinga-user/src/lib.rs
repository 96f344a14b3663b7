//! # Icinga User
//!
//! Validated, idempotent resolution of Icinga user declarations.
//!
//! A caller hands `(identifier, params)` pairs to a [`ConvergenceRun`],
//! which validates them and declares one [`UserEntity`] per identifier. The
//! run then yields [`Declaration`]s, in the order users were first declared,
//! for an engine to materialize.
//!
//! ## Example
//!
//! ```
//! use icinga_user::{ConvergenceRun, Ensure, UserParams, ValidationError};
//!
//! let mut run = ConvergenceRun::new();
//!
//! let user = run.resolve("dummyuser2", &UserParams::present().with_password("default"))?;
//! assert_eq!(user.ensure(), Ensure::Present);
//!
//! // Credentials are dropped for users being removed
//! let gone = run.resolve("olduser", &UserParams::absent().with_password("x"))?;
//! assert!(gone.password().is_none());
//!
//! // Unknown ensure values are rejected
//! let err = run.resolve("u", &UserParams::default().with_ensure("maybe"));
//! assert!(matches!(err, Err(ValidationError::InvalidEnsureValue { .. })));
//!
//! for decl in run.declarations() {
//!     if let Some(fragment) = decl.render() {
//!         print!("{fragment}");
//!     }
//! }
//! # Ok::<(), ValidationError>(())
//! ```
//!
//! Resolution does no I/O. Writing fragments and reloading Icinga are left
//! to the engine.

mod error;
mod render;
mod run;
mod types;

pub use error::{Result, ValidationError};
pub use render::{
    Declaration, FRAGMENT_EXTENSION, FRAGMENT_PREFIX, fragment_file_name, is_fragment_file_name,
    render_fragment,
};
pub use run::ConvergenceRun;
pub use types::{Ensure, Password, UserEntity, UserParams};
