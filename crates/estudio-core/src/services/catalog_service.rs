use tracing::{debug, instrument, warn};

use crate::domain::{BlobKey, Bucket, Release, ReleaseId, TrackId, UserId, Work};
use crate::errors::CoreError;
use crate::ports::{BlobStore, ReleaseStore};

/// Consulta y edición de los lanzamientos ya publicados.
///
/// La edición es una sola sentencia por operación y no usa la
/// compensación del publicador.
pub struct CatalogService<R, B>
where
  R: ReleaseStore,
  B: BlobStore,
{
  releases: R,
  blobs: B,
}

impl<R, B> CatalogService<R, B>
where
  R: ReleaseStore,
  B: BlobStore,
{
  pub fn new(releases: R, blobs: B) -> Self {
    Self { releases, blobs }
  }

  // -------- QUERY (read) --------

  /// Obras del usuario, de la más reciente a la más antigua.
  pub async fn list_works(&self, user: Option<UserId>) -> Result<Vec<Work>, CoreError> {
    let user = user.ok_or(CoreError::Unauthenticated)?;
    Ok(self.releases.list_works(user).await?)
  }

  // -------- COMMAND (write) --------

  /// Renombra la obra: el álbum en álbum/EP, la única pista en single/podcast.
  #[instrument(skip(self))]
  pub async fn rename_release(
    &self,
    user: Option<UserId>,
    release: ReleaseId,
    name: &str,
  ) -> Result<(), CoreError> {
    let name = required(name, "name")?;
    let release = self.owned_release(user, release).await?;

    if release.kind.requires_album() {
      self.releases.rename_album(release.id, name).await?;
    } else {
      let tracks = self.releases.list_tracks(release.id).await?;
      let track = tracks.first().ok_or(CoreError::NotFound)?;
      self.releases.rename_track(track.id, name).await?;
    }

    Ok(())
  }

  #[instrument(skip(self))]
  pub async fn rename_track(
    &self,
    user: Option<UserId>,
    release: ReleaseId,
    track: TrackId,
    name: &str,
  ) -> Result<(), CoreError> {
    let name = required(name, "name")?;
    let release = self.owned_release(user, release).await?;

    let tracks = self.releases.list_tracks(release.id).await?;
    if !tracks.iter().any(|t| t.id == track) {
      return Err(CoreError::NotFound);
    }

    Ok(self.releases.rename_track(track, name).await?)
  }

  #[instrument(skip(self))]
  pub async fn set_genre(&self, user: Option<UserId>, release: ReleaseId, genre: &str) -> Result<(), CoreError> {
    let release = self.owned_release(user, release).await?;
    Ok(self.releases.update_genre(release.id, genre.trim()).await?)
  }

  /// Borra la obra entera y, en lo posible, sus archivos.
  ///
  /// Los archivos se borran después de las filas; un fallo ahí solo se registra.
  #[instrument(skip(self))]
  pub async fn delete_release(&self, user: Option<UserId>, release: ReleaseId) -> Result<(), CoreError> {
    let release = self.owned_release(user, release).await?;
    let tracks = self.releases.list_tracks(release.id).await?;

    self.releases.delete_tracks_by_release(release.id).await?;
    if release.album_id.is_some() {
      self.releases.link_album(release.id, None).await?;
    }
    self.releases.delete_albums_by_release(release.id).await?;
    self.releases.delete_release(release.id).await?;

    let audio: Vec<BlobKey> =
      tracks.iter().filter_map(|t| self.blobs.key_from_url(Bucket::Audio, &t.audio_url)).collect();
    self.remove_quietly(Bucket::Audio, &audio).await;

    if let Some(cover) = release.image_url.as_deref().and_then(|url| self.blobs.key_from_url(Bucket::Images, url)) {
      self.remove_quietly(Bucket::Images, &[cover]).await;
    }

    Ok(())
  }

  async fn owned_release(&self, user: Option<UserId>, id: ReleaseId) -> Result<Release, CoreError> {
    let user = user.ok_or(CoreError::Unauthenticated)?;
    let release = self.releases.find_release(id).await?.ok_or(CoreError::NotFound)?;

    if release.user_id != user {
      return Err(CoreError::Forbidden);
    }

    Ok(release)
  }

  async fn remove_quietly(&self, bucket: Bucket, keys: &[BlobKey]) {
    if keys.is_empty() {
      return;
    }

    match self.blobs.remove(bucket, keys).await {
      Ok(n) => debug!(%bucket, removed = n, "removed blobs"),
      Err(e) => warn!(%bucket, error = %e, "failed to remove blobs of deleted release"),
    }
  }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, CoreError> {
  let value = value.trim();
  if value.is_empty() {
    return Err(CoreError::Validation(format!("{field} must not be empty")));
  }
  Ok(value)
}
