mod backend;
mod io;
mod paths;

pub use backend::{ConfigBackend, TomlConfigBackend};
pub use io::atomic_write_str;
pub use paths::{ConfigError, EstudioPaths};

use once_cell::sync::Lazy;

// Singleton de paths (ESTUDIO_BASE_DIR / system)
pub static PATHS: Lazy<EstudioPaths> = Lazy::new(|| EstudioPaths::detect().expect("failed to init EstudioPaths"));

// Singleton del backend de config
pub static CONFIG_BACKEND: Lazy<TomlConfigBackend> = Lazy::new(|| TomlConfigBackend::new(PATHS.config_file()));
