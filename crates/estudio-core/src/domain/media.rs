use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::ids::UserId;

/// Extensión usada cuando el nombre original no tiene ninguna.
const FALLBACK_EXTENSION: &str = "bin";

/// Archivo binario (imagen o audio) elegido por el usuario, aún sin subir.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
  /// Nombre original; solo se usa para derivar la extensión.
  pub file_name: String,
  pub bytes: Vec<u8>,
}

impl MediaFile {
  pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
    Self { file_name: file_name.into(), bytes: bytes.into() }
  }

  /// Texto tras el último `.` del nombre, en minúsculas.
  pub fn extension(&self) -> String {
    match self.file_name.rsplit_once('.') {
      Some((_, ext)) if !ext.is_empty() && !ext.contains(['/', '\\']) => ext.to_lowercase(),
      _ => FALLBACK_EXTENSION.to_string(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

// Solo el tamaño, nunca los bytes.
impl fmt::Debug for MediaFile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MediaFile")
      .field("file_name", &self.file_name)
      .field("len", &self.bytes.len())
      .finish()
  }
}

/// Contenedor lógico dentro del almacenamiento de blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
  /// Portadas de lanzamientos.
  Images,
  /// Audio de las pistas.
  Audio,
  /// Fotos de perfil.
  ProfilePhotos,
}

impl Bucket {
  pub fn as_str(self) -> &'static str {
    match self {
      Bucket::Images => "albums",
      Bucket::Audio => "musicas",
      Bucket::ProfilePhotos => "fotos-perfil",
    }
  }
}

impl fmt::Display for Bucket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Clave de un objeto dentro de un [`Bucket`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobKey(String);

impl BlobKey {
  /// `<uuid>.<ext>`: claves de portada, sin prefijo.
  pub fn random(extension: &str) -> Self {
    BlobKey(format!("{}.{extension}", Uuid::new_v4()))
  }

  /// `<user>/<uuid>.<ext>`: claves de audio, agrupadas por usuario.
  pub fn scoped(user: UserId, extension: &str) -> Self {
    BlobKey(format!("{user}/{}.{extension}", Uuid::new_v4()))
  }

  /// `<user>.<ext>`: la foto de perfil se sobrescribe siempre en la misma clave.
  pub fn profile_photo(user: UserId, extension: &str) -> Self {
    BlobKey(format!("{user}.{extension}"))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<String> for BlobKey {
  fn from(s: String) -> Self {
    BlobKey(s)
  }
}

impl From<&str> for BlobKey {
  fn from(s: &str) -> Self {
    BlobKey(s.to_string())
  }
}

impl fmt::Display for BlobKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Política ante una clave ya ocupada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
  /// Falla con `BlobError::AlreadyExists`.
  CreateNew,
  Overwrite,
}
