//! Error types for user-data assembly

use thiserror::Error;

use crate::cluster::OsFamily;

/// Errors that can occur while assembling a boot-configuration document
///
/// Assembly is a single-attempt computation - every error is surfaced to the
/// caller immediately and nothing is retried internally
#[derive(Debug, Error)]
pub enum Error {
  /// A required input was missing before any assembly work started
  #[error("precondition failed: {0}")]
  PreconditionFailed(&'static str),

  /// The cluster spec carries no certificate authority material
  #[error("missing credential data: {0}")]
  MissingCredentialData(&'static str),

  /// The certificate authority material could not be decoded
  #[error("invalid certificate authority data: {0}")]
  InvalidCertificate(#[from] base64::DecodeError),

  /// A file or script was registered twice under the same name
  #[error("duplicate {kind} entry: {name}")]
  DuplicateEntry { kind: &'static str, name: String },

  /// A downstream document could not be produced from valid-looking inputs
  #[error("failed to render {what}: {reason}")]
  Render { what: &'static str, reason: String },

  /// The final boot-configuration document could not be serialized
  #[error("encoding user data: {reason}")]
  Encoding { reason: String },

  /// No bootstrap script is available for the OS family
  #[error("no bootstrap script embedded for OS family {0:?}")]
  MissingScript(OsFamily),
}

/// Result type for user-data assembly operations
pub type Result<T> = std::result::Result<T, Error>;
