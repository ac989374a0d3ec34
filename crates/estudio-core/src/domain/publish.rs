use crate::domain::media::MediaFile;
use crate::domain::release_kind::ReleaseKind;

/// Metadatos comunes del formulario de publicación.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseMetadata {
  /// Obligatorio para álbum/EP. En single/podcast es el nombre de
  /// respaldo de la pista.
  pub name: String,
  pub genre: String,
  pub release_date: Option<String>,
  pub cover: Option<MediaFile>,
}

/// Una entrada de pista tal como la rellena el usuario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackDraft {
  pub name: String,
  pub audio: Option<MediaFile>,
}

impl TrackDraft {
  pub fn new(name: impl Into<String>, audio: Option<MediaFile>) -> Self {
    Self { name: name.into(), audio }
  }

  /// Una pista de álbum/EP solo cuenta si tiene nombre y archivo.
  pub fn is_valid(&self) -> bool {
    !self.name.trim().is_empty() && self.audio.is_some()
  }
}

/// Entrada completa de `ReleasePublisher::publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
  pub kind: ReleaseKind,
  pub metadata: ReleaseMetadata,
  pub tracks: Vec<TrackDraft>,
}

impl PublishRequest {
  /// Nombre del lanzamiento recortado.
  pub fn release_name(&self) -> &str {
    self.metadata.name.trim()
  }

  /// Fecha normalizada: una cadena vacía equivale a "sin fecha".
  pub fn release_date(&self) -> Option<String> {
    self.metadata.release_date.as_deref().map(str::trim).filter(|d| !d.is_empty()).map(String::from)
  }

  /// Pistas de álbum/EP con nombre y archivo, en su orden original.
  pub fn valid_tracks(&self) -> impl Iterator<Item = &TrackDraft> {
    self.tracks.iter().filter(|t| t.is_valid())
  }
}
