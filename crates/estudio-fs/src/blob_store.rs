use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use estudio_core::domain::{BlobKey, Bucket, WriteMode};
use estudio_core::ports::{BlobError, BlobStore};

use crate::config::MediaConfig;

/// Blob store sobre el sistema de ficheros.
///
/// Cada objeto vive en `<root>/<bucket>/<key>` y se publica como
/// `<public_base_url>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
  public_base_url: String,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
    Self { root: root.into(), public_base_url: public_base_url.trim_end_matches('/').to_string() }
  }

  pub fn from_config(cfg: &MediaConfig) -> Self {
    Self::new(&cfg.root_dir, &cfg.public_base_url)
  }

  /// Ruta del objeto; rechaza claves vacías, absolutas o con `..`.
  fn object_path(&self, bucket: Bucket, key: &BlobKey) -> Result<PathBuf, BlobError> {
    let rel = Path::new(key.as_str());
    let valid = !key.as_str().is_empty()
      && !key.as_str().contains('\\')
      && rel.components().all(|c| matches!(c, Component::Normal(_)));

    if !valid {
      return Err(BlobError::InvalidKey(key.to_string()));
    }

    Ok(self.root.join(bucket.as_str()).join(rel))
  }
}

fn io_err(e: io::Error) -> BlobError {
  BlobError::Io(e.to_string())
}

async fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
  let mut file = OpenOptions::new().write(true).create_new(true).open(path).await?;

  let written = async {
    file.write_all(bytes).await?;
    file.sync_all().await
  }
  .await;

  if written.is_err() {
    // No dejar un objeto truncado bajo una clave válida.
    let _ = fs::remove_file(path).await;
  }
  written
}

async fn write_replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
  let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
  let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

  {
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
  }

  if let Err(e) = fs::rename(&tmp, path).await {
    let _ = fs::remove_file(&tmp).await;
    return Err(e);
  }
  Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
  async fn upload(&self, bucket: Bucket, key: &BlobKey, bytes: &[u8], mode: WriteMode) -> Result<(), BlobError> {
    let path = self.object_path(bucket, key)?;

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let result = match mode {
      WriteMode::CreateNew => write_new(&path, bytes).await,
      WriteMode::Overwrite => write_replace(&path, bytes).await,
    };

    match result {
      Ok(()) => {
        trace!(%bucket, %key, len = bytes.len(), "blob written");
        Ok(())
      }
      Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(BlobError::AlreadyExists(key.to_string())),
      Err(e) => Err(io_err(e)),
    }
  }

  fn public_url(&self, bucket: Bucket, key: &BlobKey) -> String {
    format!("{}/{bucket}/{key}", self.public_base_url)
  }

  fn key_from_url(&self, bucket: Bucket, url: &str) -> Option<BlobKey> {
    let prefix = format!("{}/{bucket}/", self.public_base_url);
    let key = BlobKey::from(url.strip_prefix(&prefix)?);
    self.object_path(bucket, &key).ok().map(|_| key)
  }

  /// Intenta borrar todas las claves aunque alguna falle; devuelve el primer error.
  async fn remove(&self, bucket: Bucket, keys: &[BlobKey]) -> Result<usize, BlobError> {
    let mut removed = 0;
    let mut first_error = None;

    for key in keys {
      let outcome = match self.object_path(bucket, key) {
        Ok(path) => fs::remove_file(&path).await.map_err(|e| (e.kind(), io_err(e))),
        Err(e) => Err((io::ErrorKind::InvalidInput, e)),
      };

      match outcome {
        Ok(()) => removed += 1,
        Err((io::ErrorKind::NotFound, _)) => {}
        Err((_, e)) => {
          warn!(%bucket, %key, error = %e, "failed to remove blob");
          first_error.get_or_insert(e);
        }
      }
    }

    debug!(%bucket, removed, requested = keys.len(), "blobs removed");
    match first_error {
      Some(e) => Err(e),
      None => Ok(removed),
    }
  }
}
