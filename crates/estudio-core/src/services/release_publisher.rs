use std::sync::atomic::{AtomicBool, Ordering};

use futures::{FutureExt, StreamExt, stream};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::domain::{
  BlobKey, Bucket, MediaFile, NewAlbum, NewRelease, NewTrack, Profile, PublishRequest, PublishedRelease,
  Release, Track, UserId, WriteMode,
};
use crate::errors::{PublishError, PublishFailure, ValidationError};
use crate::ports::{BlobError, BlobStore, ProfileStore, ReleaseStore};
use crate::services::saga::{SagaLog, SagaStep};

/// Ajustes del publicador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherConfig {
  /// Subidas de audio simultáneas dentro de un mismo lanzamiento.
  #[serde(default = "default_max_concurrent_uploads")]
  pub max_concurrent_uploads: usize,
}

fn default_max_concurrent_uploads() -> usize {
  4
}

impl Default for PublisherConfig {
  fn default() -> Self {
    PublisherConfig { max_concurrent_uploads: default_max_concurrent_uploads() }
  }
}

/// Pista lista para subir: nombre ya recortado y archivo presente.
type ReadyTrack<'a> = (&'a str, &'a MediaFile);

/// Resultado de una subida individual dentro del lote de audio.
enum UploadOutcome {
  /// No se inició: otra subida ya había fallado o se canceló el intento.
  Skipped,
  Attempted { key: BlobKey, result: Result<(), BlobError> },
}

/// Orquesta la creación de un lanzamiento completo.
///
/// La secuencia es: portada → lanzamiento → álbum → enlace → audio → pistas.
/// No hay transacción entre pasos, así que cada paso se anota en un
/// [`SagaLog`] y, ante cualquier fallo, se deshace en orden inverso.
/// Nada se reintenta; reintentar es decisión del llamador.
pub struct ReleasePublisher<R, P, B>
where
  R: ReleaseStore,
  P: ProfileStore,
  B: BlobStore,
{
  releases: R,
  profiles: P,
  blobs: B,
  config: PublisherConfig,
}

impl<R, P, B> ReleasePublisher<R, P, B>
where
  R: ReleaseStore,
  P: ProfileStore,
  B: BlobStore,
{
  pub fn new(releases: R, profiles: P, blobs: B, config: PublisherConfig) -> Self {
    Self { releases, profiles, blobs, config }
  }

  /// Publica un lanzamiento.
  ///
  /// `user` es la sesión ya resuelta por el llamador; `None` falla con
  /// `Unauthenticated` sin escribir nada. El token de cancelación se
  /// consulta entre pasos: un intento cancelado compensa igualmente todo
  /// lo escrito y devuelve `PublishError::Cancelled`.
  #[instrument(name = "release.publish", skip_all, fields(kind = %request.kind, user = ?user))]
  pub async fn publish(
    &self,
    user: Option<UserId>,
    request: PublishRequest,
    cancel: &CancellationToken,
  ) -> Result<PublishedRelease, PublishFailure> {
    let user = user.ok_or(PublishError::Unauthenticated)?;
    let profile = self
      .profiles
      .find_profile(user)
      .await
      .map_err(PublishError::from)?
      .ok_or(PublishError::Unauthenticated)?;

    let mut log = SagaLog::default();

    match self.run(&mut log, &profile, &request, cancel).await {
      Ok(published) => {
        info!(release = %published.release.id, tracks = published.tracks.len(), "release published");
        Ok(published)
      }
      Err(err) => {
        error!(error = %err, "publish failed, compensating");
        let compensation = log.compensate(&self.releases, &self.blobs).await;
        Err(PublishFailure { error: err, compensation })
      }
    }
  }

  async fn run(
    &self,
    log: &mut SagaLog,
    profile: &Profile,
    request: &PublishRequest,
    cancel: &CancellationToken,
  ) -> Result<PublishedRelease, PublishError> {
    checkpoint(cancel)?;

    let image_url = match &request.metadata.cover {
      Some(cover) => {
        let key = BlobKey::random(&cover.extension());
        log.record(SagaStep::CoverUploaded(key.clone()));
        self.blobs.upload(Bucket::Images, &key, &cover.bytes, WriteMode::CreateNew).await?;
        Some(self.blobs.public_url(Bucket::Images, &key))
      }
      None => None,
    };

    checkpoint(cancel)?;

    let release = self
      .releases
      .insert_release(NewRelease {
        user_id: profile.id,
        artist_name: profile.name.clone(),
        kind: request.kind,
        genre: request.metadata.genre.trim().to_string(),
        release_date: request.release_date(),
        image_url,
      })
      .await?;
    log.record(SagaStep::ReleaseInserted(release.id));

    if request.kind.requires_album() {
      self.publish_album(log, profile.id, release, request, cancel).await
    } else {
      self.publish_single(log, profile.id, release, request, cancel).await
    }
  }

  /// Rama álbum/EP: álbum, enlace, subidas y alta masiva de pistas.
  async fn publish_album(
    &self,
    log: &mut SagaLog,
    user: UserId,
    mut release: Release,
    request: &PublishRequest,
    cancel: &CancellationToken,
  ) -> Result<PublishedRelease, PublishError> {
    let name = request.release_name();
    if name.is_empty() {
      return Err(ValidationError::MissingReleaseName.into());
    }

    checkpoint(cancel)?;
    log.record(SagaStep::AlbumInserted(release.id));
    let album = self.releases.insert_album(NewAlbum { name: name.to_string(), release_id: release.id }).await?;

    checkpoint(cancel)?;
    log.record(SagaStep::AlbumLinked(release.id));
    self.releases.link_album(release.id, Some(album.id)).await?;
    release.album_id = Some(album.id);

    let ready: Vec<ReadyTrack<'_>> = request
      .valid_tracks()
      .filter_map(|t| t.audio.as_ref().map(|audio| (t.name.trim(), audio)))
      .collect();
    if ready.is_empty() {
      return Err(ValidationError::NoValidTracks.into());
    }

    let urls = self.upload_tracks(log, user, &ready, cancel).await?;
    let tracks = self.insert_tracks(log, &release, &ready, urls, cancel).await?;

    Ok(PublishedRelease { release, album: Some(album), tracks })
  }

  /// Rama single/podcast: una sola pista, nunca un álbum.
  async fn publish_single(
    &self,
    log: &mut SagaLog,
    user: UserId,
    release: Release,
    request: &PublishRequest,
    cancel: &CancellationToken,
  ) -> Result<PublishedRelease, PublishError> {
    let draft = request.tracks.first();

    let Some(audio) = draft.and_then(|t| t.audio.as_ref()) else {
      return Err(ValidationError::MissingAudioFile.into());
    };

    let name = draft
      .map(|t| t.name.trim())
      .filter(|n| !n.is_empty())
      .unwrap_or_else(|| request.release_name());
    if name.is_empty() {
      return Err(ValidationError::MissingTrackName.into());
    }

    let ready = [(name, audio)];
    let urls = self.upload_tracks(log, user, &ready, cancel).await?;
    let tracks = self.insert_tracks(log, &release, &ready, urls, cancel).await?;

    Ok(PublishedRelease { release, album: None, tracks })
  }

  /// Sube el audio con un máximo de `max_concurrent_uploads` subidas en vuelo.
  ///
  /// Tras el primer error no se inicia ninguna subida nueva, pero las que ya
  /// estaban en vuelo terminan y quedan anotadas para la compensación.
  /// Devuelve las URLs públicas en el mismo orden que `tracks`.
  async fn upload_tracks(
    &self,
    log: &mut SagaLog,
    user: UserId,
    tracks: &[ReadyTrack<'_>],
    cancel: &CancellationToken,
  ) -> Result<Vec<String>, PublishError> {
    checkpoint(cancel)?;

    let aborted = AtomicBool::new(false);
    let aborted = &aborted;
    let limit = self.config.max_concurrent_uploads.max(1);

    // Futuros creados de antemano y en caja: el lote tiene que ser `Send`.
    let jobs: Vec<_> = tracks
      .iter()
      .map(|&(_, audio)| {
        async move {
          if aborted.load(Ordering::Acquire) || cancel.is_cancelled() {
            return UploadOutcome::Skipped;
          }

          let key = BlobKey::scoped(user, &audio.extension());
          let result = self.blobs.upload(Bucket::Audio, &key, &audio.bytes, WriteMode::CreateNew).await;
          if result.is_err() {
            aborted.store(true, Ordering::Release);
          }

          UploadOutcome::Attempted { key, result }
        }
        .boxed()
      })
      .collect();

    let mut outcomes = stream::iter(jobs).buffered(limit);
    let mut keys = Vec::with_capacity(tracks.len());
    let mut urls = Vec::with_capacity(tracks.len());
    let mut first_error = None;

    while let Some(outcome) = outcomes.next().await {
      match outcome {
        UploadOutcome::Skipped => {}
        UploadOutcome::Attempted { key, result: Ok(()) } => {
          urls.push(self.blobs.public_url(Bucket::Audio, &key));
          keys.push(key);
        }
        UploadOutcome::Attempted { key, result: Err(e) } => {
          keys.push(key);
          first_error.get_or_insert(e);
        }
      }
    }

    log.record(SagaStep::AudioUploaded(keys));

    if let Some(e) = first_error {
      return Err(e.into());
    }
    checkpoint(cancel)?;

    Ok(urls)
  }

  async fn insert_tracks(
    &self,
    log: &mut SagaLog,
    release: &Release,
    tracks: &[ReadyTrack<'_>],
    urls: Vec<String>,
    cancel: &CancellationToken,
  ) -> Result<Vec<Track>, PublishError> {
    checkpoint(cancel)?;

    let rows = tracks
      .iter()
      .zip(urls)
      .map(|((name, _), audio_url)| NewTrack { name: name.to_string(), release_id: release.id, audio_url })
      .collect();

    log.record(SagaStep::TracksInserted(release.id));
    Ok(self.releases.insert_tracks(rows).await?)
  }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), PublishError> {
  if cancel.is_cancelled() { Err(PublishError::Cancelled) } else { Ok(()) }
}
