use crate::io::atomic_write_str;
use crate::paths::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

// toml_edit para escribir sin perder los comentarios del usuario
use toml_edit::{DocumentMut, Item};

/// Acceso por secciones (`[storage]`, `[media]`...) a la configuración.
pub trait ConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError>;
  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError>;

  /// Como `load_section`, pero un archivo o sección ausentes dan `T::default()`.
  fn load_section_with_default<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Default;
}

/// Backend sobre un único `estudio.toml`.
pub struct TomlConfigBackend {
  path: PathBuf,
}

impl TomlConfigBackend {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  fn read_table(&self) -> Result<Option<toml::Table>, ConfigError> {
    match fs::read_to_string(&self.path) {
      Ok(content) => Ok(Some(toml::from_str(&content)?)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }
}

fn decode<T: DeserializeOwned>(section: &str, value: &toml::Value) -> Result<T, ConfigError> {
  value.clone().try_into().map_err(|e| ConfigError::Other(format!("decode section [{section}]: {e}")))
}

impl ConfigBackend for TomlConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError> {
    let table = self
      .read_table()?
      .ok_or_else(|| ConfigError::Other(format!("config file {:?} does not exist", self.path)))?;

    let value = table
      .get(section)
      .ok_or_else(|| ConfigError::Other(format!("missing section [{section}] in {:?}", self.path)))?;

    decode(section, value)
  }

  fn load_section_with_default<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Default,
  {
    let Some(table) = self.read_table()? else {
      return Ok(T::default());
    };

    match table.get(section) {
      Some(value) => decode(section, value),
      None => Ok(T::default()),
    }
  }

  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError> {
    // 1) Documento actual, o uno vacío si aún no hay archivo.
    let mut doc: DocumentMut = match fs::read_to_string(&self.path) {
      Ok(content) => content
        .parse::<DocumentMut>()
        .map_err(|e| ConfigError::Other(format!("parse toml_edit doc: {e}")))?,
      Err(e) if e.kind() == ErrorKind::NotFound => DocumentMut::new(),
      Err(e) => return Err(e.into()),
    };

    // 2) La sección serializada con serde llega como "clave = valor" sin cabecera.
    let section_str =
      toml::to_string(value).map_err(|e| ConfigError::Other(format!("encode section [{section}]: {e}")))?;

    let section_item: Item = section_str
      .parse::<DocumentMut>()
      .map_err(|e| ConfigError::Other(format!("parse section as doc: {e}")))?
      .into_item();

    // 3) Reemplazar solo esa sección; el resto del documento queda intacto.
    doc[section] = section_item;

    atomic_write_str(&self.path, &doc.to_string())?;
    tracing::debug!(section, path = ?self.path, "config section saved");

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use serde::Deserialize;
  use tempfile::tempdir;

  #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
  struct Sample {
    name: String,
    limit: u32,
  }

  #[test]
  fn test_missing_file_yields_default() {
    let tmp = tempdir().unwrap();
    let backend = TomlConfigBackend::new(tmp.path().join("estudio.toml"));

    let sample: Sample = backend.load_section_with_default("sample").unwrap();
    assert_eq!(sample, Sample::default());
    assert!(backend.load_section::<Sample>("sample").is_err());
  }

  #[test]
  fn test_save_then_load_section() {
    let tmp = tempdir().unwrap();
    let backend = TomlConfigBackend::new(tmp.path().join("estudio.toml"));
    let sample = Sample { name: "x".into(), limit: 3 };

    backend.save_section("sample", &sample).unwrap();

    assert_eq!(backend.load_section::<Sample>("sample").unwrap(), sample);
  }

  #[test]
  fn test_save_preserves_comments_and_other_sections() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("estudio.toml");
    fs::write(&path, "# mantener\n[other]\nkeep = true\n").unwrap();
    let backend = TomlConfigBackend::new(&path);

    backend.save_section("sample", &Sample { name: "y".into(), limit: 1 }).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("# mantener"));
    assert!(written.contains("keep = true"));
    assert!(written.contains("[sample]"));
  }
}
