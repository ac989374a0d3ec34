use tracing::{debug, warn};

use crate::domain::{BlobKey, Bucket, ReleaseId};
use crate::errors::CompensationFailure;
use crate::ports::{BlobStore, ReleaseStore};

/// Paso completado (o iniciado) de una publicación, con lo necesario para deshacerlo.
///
/// Los pasos se registran *antes* de la llamada, salvo `ReleaseInserted`,
/// cuyo id lo asigna el store. Todos los deshacer son idempotentes (borrado
/// por clave o por clave foránea).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SagaStep {
  CoverUploaded(BlobKey),
  ReleaseInserted(ReleaseId),
  AlbumInserted(ReleaseId),
  AlbumLinked(ReleaseId),
  AudioUploaded(Vec<BlobKey>),
  TracksInserted(ReleaseId),
}

impl SagaStep {
  fn undo_label(&self) -> &'static str {
    match self {
      SagaStep::CoverUploaded(_) => "remove cover image",
      SagaStep::ReleaseInserted(_) => "delete release",
      SagaStep::AlbumInserted(_) => "delete album",
      SagaStep::AlbumLinked(_) => "unlink album",
      SagaStep::AudioUploaded(_) => "remove audio files",
      SagaStep::TracksInserted(_) => "delete tracks",
    }
  }
}

/// Registro ordenado de pasos de una publicación.
///
/// Se recorre en orden inverso al fallar. Cada deshacer se intenta aunque
/// el anterior haya fallado; los fallos se devuelven, nunca se reintentan.
#[derive(Debug, Default)]
pub(crate) struct SagaLog {
  steps: Vec<SagaStep>,
}

impl SagaLog {
  pub(crate) fn record(&mut self, step: SagaStep) {
    self.steps.push(step);
  }

  #[cfg(test)]
  pub(crate) fn steps(&self) -> &[SagaStep] {
    &self.steps
  }

  /// Consume el registro: la compensación corre exactamente una vez.
  pub(crate) async fn compensate<R, B>(self, store: &R, blobs: &B) -> Vec<CompensationFailure>
  where
    R: ReleaseStore + ?Sized,
    B: BlobStore + ?Sized,
  {
    let mut failures = Vec::new();

    for step in self.steps.into_iter().rev() {
      let label = step.undo_label();

      let outcome = match &step {
        SagaStep::TracksInserted(release) => {
          store.delete_tracks_by_release(*release).await.map(|_| ()).map_err(|e| e.to_string())
        }
        SagaStep::AudioUploaded(keys) if keys.is_empty() => Ok(()),
        SagaStep::AudioUploaded(keys) => {
          blobs.remove(Bucket::Audio, keys).await.map(|_| ()).map_err(|e| e.to_string())
        }
        SagaStep::AlbumLinked(release) => {
          store.link_album(*release, None).await.map_err(|e| e.to_string())
        }
        SagaStep::AlbumInserted(release) => {
          store.delete_albums_by_release(*release).await.map(|_| ()).map_err(|e| e.to_string())
        }
        SagaStep::ReleaseInserted(release) => {
          store.delete_release(*release).await.map(|_| ()).map_err(|e| e.to_string())
        }
        SagaStep::CoverUploaded(key) => blobs
          .remove(Bucket::Images, std::slice::from_ref(key))
          .await
          .map(|_| ())
          .map_err(|e| e.to_string()),
      };

      match outcome {
        Ok(()) => debug!(step = label, "compensated"),
        Err(message) => {
          warn!(step = label, error = %message, "compensation step failed");
          failures.push(CompensationFailure { step: label, message });
        }
      }
    }

    failures
  }
}
