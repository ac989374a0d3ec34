use std::path::{Path, PathBuf};

use anyhow::Context;
use estudio_config::{CONFIG_BACKEND, ConfigBackend, ConfigError};
use estudio_core::domain::{
  MediaFile, PublishRequest, ReleaseKind, ReleaseMetadata, TrackDraft, UserId, Work,
};
use estudio_core::services::PublisherConfig;
use serde::{Deserialize, Serialize};

/// Loads the `[publisher]` section, writing defaults back on first run.
pub fn load_publisher_config() -> Result<PublisherConfig, ConfigError> {
  let cfg: PublisherConfig = CONFIG_BACKEND.load_section_with_default("publisher")?;
  CONFIG_BACKEND.save_section("publisher", &cfg)?;
  Ok(cfg)
}

/// The signed-in user, persisted in the `[session]` section.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
  pub user_id: Option<UserId>,
}

impl SessionConfig {
  pub fn load() -> Result<Self, ConfigError> {
    Self::load_from(&*CONFIG_BACKEND)
  }

  /// A missing section means nobody is signed in.
  pub fn load_from<B: ConfigBackend>(backend: &B) -> Result<Self, ConfigError> {
    backend.load_section_with_default("session")
  }

  pub fn save(&self) -> Result<(), ConfigError> {
    CONFIG_BACKEND.save_section("session", self)
  }
}

/// A work as shown in the "my works" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkDto {
  pub id: String,
  pub title: String,
  pub kind: String,
  pub genre: String,
  pub release_date: Option<String>,
  pub image_url: Option<String>,
  pub created_at: String,
  pub tracks: Vec<String>,
}

impl From<Work> for WorkDto {
  fn from(work: Work) -> Self {
    let title = work.display_title();
    let release = work.release;
    WorkDto {
      id: release.id.to_string(),
      title,
      kind: release.kind.to_string(),
      genre: release.genre,
      release_date: release.release_date,
      image_url: release.image_url,
      created_at: release.created_at,
      tracks: work.track_names,
    }
  }
}

/// JSON description of a release to publish. File paths are resolved
/// relative to the manifest's directory.
///
/// ```json
/// {
///   "kind": "album",
///   "name": "Noites",
///   "genre": "MPB",
///   "release_date": "2024-03-01",
///   "cover": "capa.png",
///   "tracks": [{ "name": "Um", "audio": "01.mp3" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseManifest {
  pub kind: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub genre: String,
  pub release_date: Option<String>,
  pub cover: Option<PathBuf>,
  #[serde(default)]
  pub tracks: Vec<TrackManifest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackManifest {
  #[serde(default)]
  pub name: String,
  pub audio: Option<PathBuf>,
}

impl ReleaseManifest {
  pub async fn load(path: &Path) -> anyhow::Result<PublishRequest> {
    let raw = tokio::fs::read_to_string(path).await.with_context(|| format!("reading manifest {}", path.display()))?;
    let manifest: ReleaseManifest =
      serde_json::from_str(&raw).with_context(|| format!("parsing manifest {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    manifest.into_request(base).await
  }

  pub async fn into_request(self, base: &Path) -> anyhow::Result<PublishRequest> {
    let kind: ReleaseKind = self.kind.parse()?;

    let cover = match &self.cover {
      Some(path) => Some(read_media(base, path).await?),
      None => None,
    };

    let mut tracks = Vec::with_capacity(self.tracks.len());
    for track in self.tracks {
      let audio = match &track.audio {
        Some(path) => Some(read_media(base, path).await?),
        None => None,
      };
      tracks.push(TrackDraft::new(track.name, audio));
    }

    Ok(PublishRequest {
      kind,
      metadata: ReleaseMetadata { name: self.name, genre: self.genre, release_date: self.release_date, cover },
      tracks,
    })
  }
}

/// Reads a file into a [`MediaFile`], resolving relative paths against `base`.
pub async fn read_media(base: &Path, path: &Path) -> anyhow::Result<MediaFile> {
  let full = base.join(path);
  let bytes = tokio::fs::read(&full).await.with_context(|| format!("reading {}", full.display()))?;
  let file_name = full.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
  Ok(MediaFile::new(file_name, bytes))
}
