use crate::domain::{BlobKey, Bucket, WriteMode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
  #[error("object already exists: {0}")]
  AlreadyExists(String),

  #[error("invalid key: {0}")]
  InvalidKey(String),

  #[error("io error: {0}")]
  Io(String),
}

/// Port del almacenamiento de objetos binarios.
///
/// Implementaciones posibles:
/// - sistema de ficheros local (`estudio-fs`)
/// - un servicio de object storage con URLs públicas
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
  async fn upload(&self, bucket: Bucket, key: &BlobKey, bytes: &[u8], mode: WriteMode) -> Result<(), BlobError>;

  /// URL pública y estable de una clave. No comprueba que el objeto exista.
  fn public_url(&self, bucket: Bucket, key: &BlobKey) -> String;

  /// Inverso de [`BlobStore::public_url`] para URLs emitidas por este store.
  fn key_from_url(&self, bucket: Bucket, url: &str) -> Option<BlobKey>;

  /// Borra las claves indicadas; las que no existen se ignoran.
  async fn remove(&self, bucket: Bucket, keys: &[BlobKey]) -> Result<usize, BlobError>;
}
