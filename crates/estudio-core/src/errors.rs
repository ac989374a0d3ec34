// crates/estudio-core/src/errors.rs
use std::fmt;

use thiserror::Error;

use crate::ports::{BlobError, StoreError};

/// Error genérico de los servicios de catálogo y perfil.
///
/// Las capas superiores (CLI, comandos de la UI) deberían mapear este error
/// a mensajes de usuario o logs.
#[derive(Debug, Error)]
pub enum CoreError {
  #[error("user is not authenticated")]
  Unauthenticated,

  #[error("release belongs to another user")]
  Forbidden,

  #[error("not found")]
  NotFound,

  #[error("validation error: {0}")]
  Validation(String),

  #[error("persistence error: {0}")]
  Persistence(#[from] StoreError),

  #[error("upload error: {0}")]
  Upload(#[from] BlobError),
}

/// Campo obligatorio ausente en una publicación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("missing release name")]
  MissingReleaseName,

  #[error("no valid tracks")]
  NoValidTracks,

  #[error("missing audio file")]
  MissingAudioFile,

  #[error("missing track name")]
  MissingTrackName,
}

/// Causa que abortó una publicación.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
  #[error("user is not authenticated")]
  Unauthenticated,

  #[error("validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("upload failed: {0}")]
  Upload(#[from] BlobError),

  #[error("persistence failed: {0}")]
  Persistence(#[from] StoreError),

  #[error("publish cancelled")]
  Cancelled,
}

/// Un paso de compensación que no pudo deshacerse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{step}: {message}")]
pub struct CompensationFailure {
  pub step: &'static str,
  pub message: String,
}

/// Fallo de `ReleasePublisher::publish`.
///
/// Lleva siempre el error original y, además, cualquier fallo ocurrido al
/// compensar. Una compensación fallida nunca se oculta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFailure {
  pub error: PublishError,
  pub compensation: Vec<CompensationFailure>,
}

impl PublishFailure {
  pub fn new(error: PublishError) -> Self {
    Self { error, compensation: Vec::new() }
  }

  /// `true` si todo lo escrito durante el intento se deshizo.
  pub fn is_clean(&self) -> bool {
    self.compensation.is_empty()
  }
}

impl From<PublishError> for PublishFailure {
  fn from(error: PublishError) -> Self {
    PublishFailure::new(error)
  }
}

impl fmt::Display for PublishFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.error)?;

    if !self.compensation.is_empty() {
      write!(f, " (compensation failed in {} step(s):", self.compensation.len())?;
      for (i, failure) in self.compensation.iter().enumerate() {
        let sep = if i == 0 { " " } else { "; " };
        write!(f, "{sep}{failure}")?;
      }
      write!(f, ")")?;
    }

    Ok(())
  }
}

impl std::error::Error for PublishFailure {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    Some(&self.error)
  }
}
