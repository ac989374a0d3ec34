//! Fakes en memoria de los ports, con inyección de fallos.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{
  Album, AlbumId, BlobKey, Bucket, NewAlbum, NewProfile, NewRelease, NewTrack, Profile, Release, ReleaseId,
  Track, TrackId, UserId, Work, WriteMode,
};
use crate::ports::{BlobError, BlobStore, ProfileStore, ReleaseStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
  FindProfile,
  InsertRelease,
  InsertAlbum,
  LinkAlbum,
  UnlinkAlbum,
  InsertTracks,
  DeleteTracks,
  DeleteAlbums,
  DeleteRelease,
}

#[derive(Debug, Default)]
struct MemoryState {
  profiles: HashMap<UserId, Profile>,
  releases: Vec<Release>,
  albums: Vec<Album>,
  tracks: Vec<Track>,
  clock: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<MemoryState>>,
  failing: Arc<Mutex<HashSet<StoreOp>>>,
}

impl MemoryStore {
  /// Store con un perfil ya registrado.
  pub fn with_profile(name: &str) -> (Self, UserId) {
    let store = MemoryStore::default();
    let id = UserId::new();
    let profile = Profile { id, email: format!("{id}@example.com"), name: name.to_string(), photo_url: None };
    store.state.lock().unwrap().profiles.insert(id, profile);
    (store, id)
  }

  pub fn fail_on(&self, op: StoreOp) {
    self.failing.lock().unwrap().insert(op);
  }

  pub fn releases(&self) -> Vec<Release> {
    self.state.lock().unwrap().releases.clone()
  }

  pub fn albums(&self) -> Vec<Album> {
    self.state.lock().unwrap().albums.clone()
  }

  pub fn tracks(&self) -> Vec<Track> {
    self.state.lock().unwrap().tracks.clone()
  }

  pub fn is_empty(&self) -> bool {
    let state = self.state.lock().unwrap();
    state.releases.is_empty() && state.albums.is_empty() && state.tracks.is_empty()
  }

  fn check(&self, op: StoreOp) -> Result<(), StoreError> {
    if self.failing.lock().unwrap().contains(&op) {
      return Err(StoreError::Backend(format!("injected failure on {op:?}")));
    }
    Ok(())
  }
}

#[async_trait]
impl ReleaseStore for MemoryStore {
  async fn insert_release(&self, new: NewRelease) -> Result<Release, StoreError> {
    self.check(StoreOp::InsertRelease)?;
    let mut state = self.state.lock().unwrap();
    state.clock += 1;
    let release = Release {
      id: ReleaseId::new(),
      user_id: new.user_id,
      artist_name: new.artist_name,
      kind: new.kind,
      genre: new.genre,
      release_date: new.release_date,
      image_url: new.image_url,
      album_id: None,
      created_at: format!("{:020}", state.clock),
    };
    state.releases.push(release.clone());
    Ok(release)
  }

  async fn insert_album(&self, new: NewAlbum) -> Result<Album, StoreError> {
    self.check(StoreOp::InsertAlbum)?;
    let album = Album { id: AlbumId::new(), name: new.name, release_id: new.release_id };
    self.state.lock().unwrap().albums.push(album.clone());
    Ok(album)
  }

  async fn link_album(&self, release: ReleaseId, album: Option<AlbumId>) -> Result<(), StoreError> {
    self.check(if album.is_some() { StoreOp::LinkAlbum } else { StoreOp::UnlinkAlbum })?;
    let mut state = self.state.lock().unwrap();
    if let Some(album) = album {
      if !state.albums.iter().any(|a| a.id == album) {
        return Err(StoreError::Constraint("album does not exist".into()));
      }
    }
    let row = state.releases.iter_mut().find(|r| r.id == release).ok_or(StoreError::NotFound)?;
    row.album_id = album;
    Ok(())
  }

  async fn insert_tracks(&self, new: Vec<NewTrack>) -> Result<Vec<Track>, StoreError> {
    self.check(StoreOp::InsertTracks)?;
    let tracks: Vec<Track> = new
      .into_iter()
      .map(|t| Track { id: TrackId::new(), name: t.name, release_id: t.release_id, audio_url: t.audio_url })
      .collect();
    self.state.lock().unwrap().tracks.extend(tracks.clone());
    Ok(tracks)
  }

  async fn delete_tracks_by_release(&self, release: ReleaseId) -> Result<usize, StoreError> {
    self.check(StoreOp::DeleteTracks)?;
    let mut state = self.state.lock().unwrap();
    let before = state.tracks.len();
    state.tracks.retain(|t| t.release_id != release);
    Ok(before - state.tracks.len())
  }

  async fn delete_albums_by_release(&self, release: ReleaseId) -> Result<usize, StoreError> {
    self.check(StoreOp::DeleteAlbums)?;
    let mut state = self.state.lock().unwrap();
    let doomed: Vec<AlbumId> = state.albums.iter().filter(|a| a.release_id == release).map(|a| a.id).collect();
    if state.releases.iter().any(|r| r.album_id.is_some_and(|id| doomed.contains(&id))) {
      return Err(StoreError::Constraint("album still referenced by a release".into()));
    }
    state.albums.retain(|a| a.release_id != release);
    Ok(doomed.len())
  }

  async fn delete_release(&self, release: ReleaseId) -> Result<usize, StoreError> {
    self.check(StoreOp::DeleteRelease)?;
    let mut state = self.state.lock().unwrap();
    let before = state.releases.len();
    state.releases.retain(|r| r.id != release);
    Ok(before - state.releases.len())
  }

  async fn rename_album(&self, release: ReleaseId, name: &str) -> Result<(), StoreError> {
    let mut state = self.state.lock().unwrap();
    let album = state.albums.iter_mut().find(|a| a.release_id == release).ok_or(StoreError::NotFound)?;
    album.name = name.to_string();
    Ok(())
  }

  async fn rename_track(&self, track: TrackId, name: &str) -> Result<(), StoreError> {
    let mut state = self.state.lock().unwrap();
    let row = state.tracks.iter_mut().find(|t| t.id == track).ok_or(StoreError::NotFound)?;
    row.name = name.to_string();
    Ok(())
  }

  async fn update_genre(&self, release: ReleaseId, genre: &str) -> Result<(), StoreError> {
    let mut state = self.state.lock().unwrap();
    let row = state.releases.iter_mut().find(|r| r.id == release).ok_or(StoreError::NotFound)?;
    row.genre = genre.to_string();
    Ok(())
  }

  async fn find_release(&self, release: ReleaseId) -> Result<Option<Release>, StoreError> {
    Ok(self.state.lock().unwrap().releases.iter().find(|r| r.id == release).cloned())
  }

  async fn find_album_by_release(&self, release: ReleaseId) -> Result<Option<Album>, StoreError> {
    Ok(self.state.lock().unwrap().albums.iter().find(|a| a.release_id == release).cloned())
  }

  async fn list_tracks(&self, release: ReleaseId) -> Result<Vec<Track>, StoreError> {
    Ok(self.state.lock().unwrap().tracks.iter().filter(|t| t.release_id == release).cloned().collect())
  }

  async fn list_works(&self, user: UserId) -> Result<Vec<Work>, StoreError> {
    let state = self.state.lock().unwrap();
    let mut releases: Vec<&Release> = state.releases.iter().filter(|r| r.user_id == user).collect();
    releases.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(
      releases
        .into_iter()
        .map(|r| Work {
          release: r.clone(),
          album_name: state.albums.iter().find(|a| a.release_id == r.id).map(|a| a.name.clone()),
          track_names: state.tracks.iter().filter(|t| t.release_id == r.id).map(|t| t.name.clone()).collect(),
        })
        .collect(),
    )
  }
}

#[async_trait]
impl ProfileStore for MemoryStore {
  async fn insert_profile(&self, new: NewProfile) -> Result<Profile, StoreError> {
    let mut state = self.state.lock().unwrap();
    if state.profiles.contains_key(&new.id) {
      return Err(StoreError::Constraint("profile already exists".into()));
    }
    let profile = Profile { id: new.id, email: new.email, name: new.name, photo_url: None };
    state.profiles.insert(new.id, profile.clone());
    Ok(profile)
  }

  async fn find_profile(&self, user: UserId) -> Result<Option<Profile>, StoreError> {
    self.check(StoreOp::FindProfile)?;
    Ok(self.state.lock().unwrap().profiles.get(&user).cloned())
  }

  async fn set_profile_photo(&self, user: UserId, photo_url: &str) -> Result<(), StoreError> {
    let mut state = self.state.lock().unwrap();
    let profile = state.profiles.get_mut(&user).ok_or(StoreError::NotFound)?;
    profile.photo_url = Some(photo_url.to_string());
    Ok(())
  }
}

#[derive(Debug, Default)]
struct BlobState {
  objects: HashMap<(Bucket, String), Vec<u8>>,
  uploads: HashMap<Bucket, usize>,
  fail_upload: Option<(Bucket, usize)>,
  fail_remove: bool,
}

/// Blob store en memoria. `fail_upload(bucket, n)` hace fallar la
/// n-ésima subida (desde 0) a ese bucket.
#[derive(Clone, Default)]
pub struct MemoryBlobs {
  state: Arc<Mutex<BlobState>>,
}

impl MemoryBlobs {
  pub fn fail_upload(&self, bucket: Bucket, nth: usize) {
    self.state.lock().unwrap().fail_upload = Some((bucket, nth));
  }

  pub fn fail_remove(&self) {
    self.state.lock().unwrap().fail_remove = true;
  }

  pub fn count(&self, bucket: Bucket) -> usize {
    self.state.lock().unwrap().objects.keys().filter(|(b, _)| *b == bucket).count()
  }

  pub fn total(&self) -> usize {
    self.state.lock().unwrap().objects.len()
  }

  pub fn contains(&self, bucket: Bucket, key: &str) -> bool {
    self.state.lock().unwrap().objects.contains_key(&(bucket, key.to_string()))
  }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
  async fn upload(&self, bucket: Bucket, key: &BlobKey, bytes: &[u8], mode: WriteMode) -> Result<(), BlobError> {
    let mut state = self.state.lock().unwrap();
    let n = state.uploads.entry(bucket).or_default();
    let nth = *n;
    *n += 1;

    if state.fail_upload == Some((bucket, nth)) {
      return Err(BlobError::Io(format!("injected upload failure #{nth} in {bucket}")));
    }

    let slot = (bucket, key.to_string());
    if mode == WriteMode::CreateNew && state.objects.contains_key(&slot) {
      return Err(BlobError::AlreadyExists(key.to_string()));
    }
    state.objects.insert(slot, bytes.to_vec());
    Ok(())
  }

  fn public_url(&self, bucket: Bucket, key: &BlobKey) -> String {
    format!("mem://{bucket}/{key}")
  }

  fn key_from_url(&self, bucket: Bucket, url: &str) -> Option<BlobKey> {
    url.strip_prefix(&format!("mem://{bucket}/")).map(BlobKey::from)
  }

  async fn remove(&self, bucket: Bucket, keys: &[BlobKey]) -> Result<usize, BlobError> {
    let mut state = self.state.lock().unwrap();
    if state.fail_remove {
      return Err(BlobError::Io("injected remove failure".into()));
    }
    Ok(keys.iter().filter(|k| state.objects.remove(&(bucket, k.to_string())).is_some()).count())
  }
}
