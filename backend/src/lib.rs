pub mod config;
pub mod infrastructure;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use estudio_core::domain::genres::filter_genres;
use estudio_core::domain::{NewProfile, Profile, PublishRequest, PublishedRelease, ReleaseId, TrackId, UserId};
use estudio_core::services::{CatalogService, ProfileService, PublisherConfig, ReleasePublisher};
use estudio_fs::{FsBlobStore, MediaConfig};
use estudio_storage::{SqliteStore, StorageConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{WorkDto, load_publisher_config, read_media};

/// Type aliases to simplify the generic signatures of the services.
type ConcretePublisher = ReleasePublisher<SqliteStore, SqliteStore, FsBlobStore>;
type ConcreteCatalog = CatalogService<SqliteStore, FsBlobStore>;
type ConcreteProfiles = ProfileService<SqliteStore, FsBlobStore>;

/// Global application state: the wired services plus the publish guard.
pub struct AppState {
  publisher: Arc<ConcretePublisher>,
  catalog: ConcreteCatalog,
  profiles: ConcreteProfiles,
  publishing: Arc<AtomicBool>,
  shutdown: CancellationToken,
}

impl AppState {
  /// Wires the adapters into the services.
  pub fn new(store: SqliteStore, blobs: FsBlobStore, publisher: PublisherConfig) -> Self {
    Self {
      publisher: Arc::new(ReleasePublisher::new(store.clone(), store.clone(), blobs.clone(), publisher)),
      catalog: CatalogService::new(store.clone(), blobs.clone()),
      profiles: ProfileService::new(store, blobs),
      publishing: Arc::new(AtomicBool::new(false)),
      shutdown: CancellationToken::new(),
    }
  }

  /// Builds the state from `estudio.toml`, creating the database and media
  /// directory on first run.
  pub fn from_config() -> anyhow::Result<Self> {
    // --- Dependency Injection Phase ---

    // 1. Persistence Adapter (SQLite)
    let storage = StorageConfig::load()?;
    let store = SqliteStore::open(&storage)?;

    // 2. Blob Adapter (Filesystem)
    let media = MediaConfig::load()?;
    let blobs = FsBlobStore::from_config(&media);

    // 3. Service Wiring
    let publisher = load_publisher_config()?;
    info!(db = %storage.db_path.display(), media = %media.root_dir.display(), "state ready");

    Ok(Self::new(store, blobs, publisher))
  }

  /// Cancelling this token cancels every in-flight publish.
  pub fn shutdown(&self) -> &CancellationToken {
    &self.shutdown
  }
}

/// Marks a publish as in flight until dropped.
struct PublishGuard(Arc<AtomicBool>);

impl PublishGuard {
  fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
    flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok()?;
    Some(PublishGuard(Arc::clone(flag)))
  }
}

impl Drop for PublishGuard {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

/// Command: publishes a release.
///
/// Only one publish may run at a time. The attempt runs on its own task, so
/// a caller that goes away does not interrupt compensation; the guard is
/// released when that task ends.
pub async fn release_publish(
  state: &AppState,
  user: Option<UserId>,
  request: PublishRequest,
) -> Result<PublishedRelease, String> {
  let guard = PublishGuard::acquire(&state.publishing).ok_or_else(|| "a publish is already in progress".to_string())?;

  let publisher = Arc::clone(&state.publisher);
  let cancel = state.shutdown.child_token();

  let task = tokio::spawn(async move {
    let _guard = guard;
    publisher.publish(user, request, &cancel).await
  });

  match task.await {
    Ok(Ok(published)) => Ok(published),
    Ok(Err(failure)) => {
      if !failure.is_clean() {
        warn!(error = %failure, "publish left partial data behind");
      }
      Err(failure.to_string())
    }
    Err(e) => Err(format!("publish task failed: {e}")),
  }
}

/// Command: lists the user's works, newest first.
pub async fn works_list(state: &AppState, user: Option<UserId>) -> Result<Vec<WorkDto>, String> {
  let works = state.catalog.list_works(user).await.map_err(|e| e.to_string())?;
  Ok(works.into_iter().map(WorkDto::from).collect())
}

/// Command: renames a work (album name, or the only track of a single/podcast).
pub async fn release_rename(
  state: &AppState,
  user: Option<UserId>,
  release: ReleaseId,
  name: &str,
) -> Result<(), String> {
  state.catalog.rename_release(user, release, name).await.map_err(|e| e.to_string())
}

/// Command: renames one track of a work.
pub async fn track_rename(
  state: &AppState,
  user: Option<UserId>,
  release: ReleaseId,
  track: TrackId,
  name: &str,
) -> Result<(), String> {
  state.catalog.rename_track(user, release, track, name).await.map_err(|e| e.to_string())
}

pub async fn release_set_genre(
  state: &AppState,
  user: Option<UserId>,
  release: ReleaseId,
  genre: &str,
) -> Result<(), String> {
  state.catalog.set_genre(user, release, genre).await.map_err(|e| e.to_string())
}

pub async fn release_delete(state: &AppState, user: Option<UserId>, release: ReleaseId) -> Result<(), String> {
  state.catalog.delete_release(user, release).await.map_err(|e| e.to_string())
}

/// Command: creates the profile of a freshly registered identity.
pub async fn profile_register(state: &AppState, email: &str, name: &str) -> Result<Profile, String> {
  let profile = NewProfile { id: UserId::new(), email: email.to_string(), name: name.to_string() };
  state.profiles.register(profile).await.map_err(|e| e.to_string())
}

pub async fn profile_show(state: &AppState, user: Option<UserId>) -> Result<Profile, String> {
  state.profiles.profile(user).await.map_err(|e| e.to_string())
}

/// Command: replaces the profile photo with the file at `path`.
pub async fn profile_update_photo(state: &AppState, user: Option<UserId>, path: &Path) -> Result<Profile, String> {
  let photo = read_media(Path::new("."), path).await.map_err(|e| format!("{e:#}"))?;
  state.profiles.update_photo(user, photo).await.map_err(|e| e.to_string())
}

/// Command: genre picker suggestions.
pub fn genres_search(query: &str) -> Result<Vec<String>, String> {
  Ok(filter_genres(query).into_iter().map(String::from).collect())
}
