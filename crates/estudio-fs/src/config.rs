use estudio_config::{CONFIG_BACKEND, ConfigBackend, ConfigError, PATHS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sección `[media]`: dónde viven los blobs y bajo qué URL se publican.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MediaConfig {
  pub root_dir: PathBuf,
  /// Prefijo de las URLs públicas, sin `/` final.
  pub public_base_url: String,
}

impl Default for MediaConfig {
  fn default() -> Self {
    let root_dir = PATHS.media_dir();
    let public_base_url = format!("file://{}", root_dir.display());
    MediaConfig { root_dir, public_base_url }
  }
}

impl MediaConfig {
  /// Carga `[media]` del backend global y persiste los valores por defecto.
  pub fn load() -> Result<Self, ConfigError> {
    let cfg = Self::load_from(&*CONFIG_BACKEND)?;
    CONFIG_BACKEND.save_section("media", &cfg)?;
    Ok(cfg)
  }

  /// Una sección ausente da los valores por defecto.
  pub fn load_from<B: ConfigBackend>(backend: &B) -> Result<Self, ConfigError> {
    backend.load_section_with_default("media")
  }
}
