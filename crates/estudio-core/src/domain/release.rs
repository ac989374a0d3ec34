use serde::{Deserialize, Serialize};

use crate::domain::ids::{AlbumId, ReleaseId, TrackId, UserId};
use crate::domain::release_kind::ReleaseKind;

/// Un lanzamiento publicado (fila `criacao`).
///
/// Es la raíz del agregado: álbum y pistas lo referencian por `id`.
/// `album_id` solo se rellena después de confirmar que la fila de
/// álbum existe, así que nunca apunta a un álbum inexistente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
  pub id: ReleaseId,
  pub user_id: UserId,
  /// Nombre público del artista, copiado del perfil al publicar.
  pub artist_name: String,
  pub kind: ReleaseKind,
  /// Texto libre; el estudio sugiere valores de [`crate::domain::genres::GENRES`].
  pub genre: String,
  /// Fecha ISO `YYYY-MM-DD` tal como la envió el usuario.
  pub release_date: Option<String>,
  pub image_url: Option<String>,
  pub album_id: Option<AlbumId>,
  pub created_at: String,
}

/// Datos para insertar un lanzamiento. El store genera `id` y `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
  pub user_id: UserId,
  pub artist_name: String,
  pub kind: ReleaseKind,
  pub genre: String,
  pub release_date: Option<String>,
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
  pub id: AlbumId,
  pub name: String,
  pub release_id: ReleaseId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
  pub name: String,
  pub release_id: ReleaseId,
}

/// Una pista de audio de un lanzamiento.
///
/// `audio_url` es obligatorio: la fila solo se escribe después de que el
/// blob de audio se haya subido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
  pub id: TrackId,
  pub name: String,
  pub release_id: ReleaseId,
  pub audio_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
  pub name: String,
  pub release_id: ReleaseId,
  pub audio_url: String,
}

/// Resultado de una publicación completa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRelease {
  pub release: Release,
  pub album: Option<Album>,
  pub tracks: Vec<Track>,
}
