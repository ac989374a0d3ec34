use crate::domain::{
  Album, AlbumId, NewAlbum, NewRelease, NewTrack, Release, ReleaseId, Track, TrackId, UserId, Work,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
  #[error("entity not found")]
  NotFound,
  #[error("constraint violated: {0}")]
  Constraint(String),
  #[error("storage error: {0}")]
  Backend(String),
}

/// Port del almacén relacional de lanzamientos, álbumes y pistas.
///
/// Cada método es una sentencia independiente: no hay transacción entre
/// llamadas. El ID devuelto por un insert debe poder usarse en la
/// siguiente llamada (lectura consistente tras escritura).
#[async_trait::async_trait]
pub trait ReleaseStore: Send + Sync {
  // --- Escritura ---
  async fn insert_release(&self, release: NewRelease) -> Result<Release, StoreError>;
  async fn insert_album(&self, album: NewAlbum) -> Result<Album, StoreError>;
  /// Fija (o limpia con `None`) la referencia del lanzamiento a su álbum.
  async fn link_album(&self, release: ReleaseId, album: Option<AlbumId>) -> Result<(), StoreError>;
  /// Inserta todas las pistas en una única sentencia: todas o ninguna.
  async fn insert_tracks(&self, tracks: Vec<NewTrack>) -> Result<Vec<Track>, StoreError>;

  // --- Borrado por clave foránea (devuelven filas afectadas) ---
  async fn delete_tracks_by_release(&self, release: ReleaseId) -> Result<usize, StoreError>;
  async fn delete_albums_by_release(&self, release: ReleaseId) -> Result<usize, StoreError>;
  async fn delete_release(&self, release: ReleaseId) -> Result<usize, StoreError>;

  // --- Edición ---
  async fn rename_album(&self, release: ReleaseId, name: &str) -> Result<(), StoreError>;
  async fn rename_track(&self, track: TrackId, name: &str) -> Result<(), StoreError>;
  async fn update_genre(&self, release: ReleaseId, genre: &str) -> Result<(), StoreError>;

  // --- Lectura ---
  async fn find_release(&self, release: ReleaseId) -> Result<Option<Release>, StoreError>;
  async fn find_album_by_release(&self, release: ReleaseId) -> Result<Option<Album>, StoreError>;
  async fn list_tracks(&self, release: ReleaseId) -> Result<Vec<Track>, StoreError>;
  /// Lanzamientos del usuario, del más reciente al más antiguo.
  async fn list_works(&self, user: UserId) -> Result<Vec<Work>, StoreError>;
}
