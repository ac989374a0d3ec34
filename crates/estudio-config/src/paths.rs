use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

/// Variable de entorno que fuerza un directorio base (modo portable / tests).
pub const BASE_DIR_ENV: &str = "ESTUDIO_BASE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml error: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("directories error: could not determine home directory")]
  Directories,
  #[error("other: {0}")]
  Other(String),
}

#[derive(Debug, Clone)]
pub struct EstudioPaths {
  pub base_dir: PathBuf,
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
  pub cache_dir: PathBuf,
}

impl EstudioPaths {
  /// Resuelve los directorios y los crea si no existen.
  ///
  /// Con `ESTUDIO_BASE_DIR` todo cuelga de esa carpeta (`config/`, `data/`,
  /// `cache/`); si no, se usan los directorios de proyecto de la plataforma.
  pub fn new() -> Result<Self, ConfigError> {
    let (config_dir, data_dir, cache_dir, base_dir);

    if let Ok(env_base) = std::env::var(BASE_DIR_ENV) {
      let base = PathBuf::from(env_base);
      config_dir = base.join("config");
      data_dir = base.join("data");
      cache_dir = base.join("cache");
      base_dir = base;
    } else {
      let proj_dirs = ProjectDirs::from("com", "estudio", "estudio").ok_or(ConfigError::Directories)?;
      base_dir = proj_dirs.data_dir().to_path_buf();
      config_dir = proj_dirs.config_dir().to_path_buf();
      data_dir = proj_dirs.data_dir().to_path_buf();
      cache_dir = proj_dirs.cache_dir().to_path_buf();
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::create_dir_all(&data_dir)?;
    std::fs::create_dir_all(&cache_dir)?;

    Ok(Self { base_dir, config_dir, data_dir, cache_dir })
  }

  pub fn detect() -> Result<Self, ConfigError> {
    Self::new()
  }

  pub fn config_file(&self) -> PathBuf {
    self.config_dir.join("estudio.toml")
  }

  /// Raíz por defecto del almacenamiento de blobs.
  pub fn media_dir(&self) -> PathBuf {
    self.data_dir.join("media")
  }
}
