pub mod config;
pub mod models;
pub mod schema;

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::BigInt;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, trace};

use estudio_core::domain::{
  Album, AlbumId, NewAlbum, NewProfile, NewRelease, NewTrack, Profile, Release, ReleaseId, Track, TrackId, UserId,
  Work,
};
use estudio_core::ports::{ProfileStore, ReleaseStore, StoreError};

use crate::models::{AlbumRow, NewProfileRow, NewReleaseRow, ProfileRow, ReleaseRow, TrackRow};
use crate::schema::{albums, criacao, musicas, perfil};

pub use config::StorageConfig;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Pragmas aplicados a cada conexión nueva del pool.
#[derive(Debug, Clone, Default)]
struct ConnectionOptions {
  journal_mode: Option<String>,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    let mut pragmas = String::from("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;");
    if let Some(mode) = &self.journal_mode {
      pragmas.push_str(&format!(" PRAGMA journal_mode = {mode};"));
    }
    conn.batch_execute(&pragmas).map_err(diesel::r2d2::Error::QueryError)
  }
}

/// Implementación SQLite de [`ReleaseStore`] y [`ProfileStore`].
///
/// Diesel es síncrono: cada operación toma una conexión del pool dentro de
/// `spawn_blocking`.
#[derive(Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl std::fmt::Debug for SqliteStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteStore").field("state", &self.pool.state()).finish()
  }
}

impl SqliteStore {
  /// Abre (o crea) la base de datos configurada y aplica las migraciones pendientes.
  pub fn open(cfg: &StorageConfig) -> Result<Self, StoreError> {
    if let Some(parent) = cfg.db_path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
    }

    let journal_mode = match cfg.journal_mode.as_deref() {
      Some(mode) if !mode.chars().all(|c| c.is_ascii_alphabetic()) => {
        return Err(StoreError::Backend(format!("invalid journal_mode: {mode}")));
      }
      other => other.map(str::to_string),
    };

    let url = cfg.db_path.to_string_lossy().into_owned();
    info!(db = %url, "opening sqlite store");
    Self::build(&url, 8, ConnectionOptions { journal_mode })
  }

  /// Base de datos en memoria. El pool tiene una sola conexión porque cada
  /// conexión `:memory:` es una base distinta.
  pub fn in_memory() -> Result<Self, StoreError> {
    Self::build(":memory:", 1, ConnectionOptions::default())
  }

  fn build(url: &str, max_size: u32, options: ConnectionOptions) -> Result<Self, StoreError> {
    let pool = Pool::builder()
      .max_size(max_size)
      .idle_timeout(None)
      .max_lifetime(None)
      .connection_customizer(Box::new(options))
      .build(ConnectionManager::<SqliteConnection>::new(url))
      .map_err(|e| StoreError::Backend(e.to_string()))?;

    let mut pooled = pool.get().map_err(|e| StoreError::Backend(e.to_string()))?;
    let conn: &mut SqliteConnection = &mut pooled;
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| StoreError::Backend(e.to_string()))?;
    if !applied.is_empty() {
      info!(count = applied.len(), "applied migrations");
    }
    drop(pooled);

    Ok(Self { pool })
  }

  async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
  where
    F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
  {
    let pool = self.pool.clone();
    tokio::task::spawn_blocking(move || {
      let mut conn = pool.get().map_err(|e| StoreError::Backend(e.to_string()))?;
      f(&mut conn)
    })
    .await
    .map_err(|e| StoreError::Backend(e.to_string()))?
  }
}

fn map_err(e: DieselError) -> StoreError {
  match e {
    DieselError::NotFound => StoreError::NotFound,
    DieselError::DatabaseError(
      DatabaseErrorKind::ForeignKeyViolation
      | DatabaseErrorKind::UniqueViolation
      | DatabaseErrorKind::NotNullViolation
      | DatabaseErrorKind::CheckViolation,
      info,
    ) => StoreError::Constraint(info.message().to_string()),
    other => StoreError::Backend(other.to_string()),
  }
}

/// `UPDATE` sobre una fila concreta: cero filas afectadas es `NotFound`.
fn expect_one(affected: usize) -> Result<(), StoreError> {
  if affected == 0 { Err(StoreError::NotFound) } else { Ok(()) }
}

fn parse<T: std::str::FromStr>(column: &str, raw: &str) -> Result<T, StoreError> {
  raw.parse().map_err(|_| StoreError::Backend(format!("corrupt {column} column: {raw:?}")))
}

fn rowid() -> diesel::expression::SqlLiteral<BigInt> {
  sql::<BigInt>("rowid")
}

fn row_to_release(row: ReleaseRow) -> Result<Release, StoreError> {
  Ok(Release {
    id: parse("criacao.id", &row.id)?,
    user_id: parse("criacao.user_id", &row.user_id)?,
    artist_name: row.nome_artista,
    kind: parse("criacao.tipo", &row.tipo)?,
    genre: row.genre,
    release_date: row.release_date,
    image_url: row.image_url,
    album_id: row.album_id.as_deref().map(|id| parse("criacao.album_id", id)).transpose()?,
    created_at: row.created_at,
  })
}

fn row_to_album(row: AlbumRow) -> Result<Album, StoreError> {
  Ok(Album {
    id: parse("albums.id", &row.id)?,
    name: row.nome_album,
    release_id: parse("albums.criacao_id", &row.criacao_id)?,
  })
}

fn row_to_track(row: TrackRow) -> Result<Track, StoreError> {
  Ok(Track {
    id: parse("musicas.id", &row.id)?,
    name: row.nome_musica,
    release_id: parse("musicas.criacao_id", &row.criacao_id)?,
    audio_url: row.audio_url,
  })
}

fn row_to_profile(row: ProfileRow) -> Result<Profile, StoreError> {
  Ok(Profile { id: parse("perfil.id", &row.id)?, email: row.email, name: row.nome, photo_url: row.foto })
}

#[async_trait]
impl ReleaseStore for SqliteStore {
  async fn insert_release(&self, release: NewRelease) -> Result<Release, StoreError> {
    self
      .run(move |conn| {
        let row = NewReleaseRow {
          id: ReleaseId::new().to_string(),
          user_id: release.user_id.to_string(),
          nome_artista: &release.artist_name,
          tipo: release.kind.as_str(),
          genre: &release.genre,
          release_date: release.release_date.as_deref(),
          image_url: release.image_url.as_deref(),
        };

        let inserted = diesel::insert_into(criacao::table)
          .values(&row)
          .returning(ReleaseRow::as_returning())
          .get_result(conn)
          .map_err(map_err)?;

        trace!(id = %inserted.id, "inserted criacao");
        row_to_release(inserted)
      })
      .await
  }

  async fn insert_album(&self, album: NewAlbum) -> Result<Album, StoreError> {
    self
      .run(move |conn| {
        let row = AlbumRow {
          id: AlbumId::new().to_string(),
          nome_album: album.name,
          criacao_id: album.release_id.to_string(),
        };
        diesel::insert_into(albums::table).values(&row).execute(conn).map_err(map_err)?;
        trace!(id = %row.id, "inserted album");
        row_to_album(row)
      })
      .await
  }

  async fn link_album(&self, release: ReleaseId, album: Option<AlbumId>) -> Result<(), StoreError> {
    self
      .run(move |conn| {
        let affected = diesel::update(criacao::table.find(release.to_string()))
          .set(criacao::album_id.eq(album.map(|id| id.to_string())))
          .execute(conn)
          .map_err(map_err)?;
        expect_one(affected)
      })
      .await
  }

  async fn insert_tracks(&self, tracks: Vec<NewTrack>) -> Result<Vec<Track>, StoreError> {
    if tracks.is_empty() {
      return Ok(Vec::new());
    }

    self
      .run(move |conn| {
        let rows: Vec<TrackRow> = tracks
          .into_iter()
          .map(|t| TrackRow {
            id: TrackId::new().to_string(),
            criacao_id: t.release_id.to_string(),
            nome_musica: t.name,
            audio_url: t.audio_url,
          })
          .collect();

        conn
          .transaction(|conn| diesel::insert_into(musicas::table).values(&rows).execute(conn))
          .map_err(map_err)?;

        debug!(count = rows.len(), "inserted musicas");
        rows.into_iter().map(row_to_track).collect()
      })
      .await
  }

  async fn delete_tracks_by_release(&self, release: ReleaseId) -> Result<usize, StoreError> {
    self
      .run(move |conn| {
        diesel::delete(musicas::table.filter(musicas::criacao_id.eq(release.to_string())))
          .execute(conn)
          .map_err(map_err)
      })
      .await
  }

  async fn delete_albums_by_release(&self, release: ReleaseId) -> Result<usize, StoreError> {
    self
      .run(move |conn| {
        diesel::delete(albums::table.filter(albums::criacao_id.eq(release.to_string())))
          .execute(conn)
          .map_err(map_err)
      })
      .await
  }

  async fn delete_release(&self, release: ReleaseId) -> Result<usize, StoreError> {
    self
      .run(move |conn| diesel::delete(criacao::table.find(release.to_string())).execute(conn).map_err(map_err))
      .await
  }

  async fn rename_album(&self, release: ReleaseId, name: &str) -> Result<(), StoreError> {
    let name = name.to_string();
    self
      .run(move |conn| {
        let affected = diesel::update(albums::table.filter(albums::criacao_id.eq(release.to_string())))
          .set(albums::nome_album.eq(name))
          .execute(conn)
          .map_err(map_err)?;
        expect_one(affected)
      })
      .await
  }

  async fn rename_track(&self, track: TrackId, name: &str) -> Result<(), StoreError> {
    let name = name.to_string();
    self
      .run(move |conn| {
        let affected = diesel::update(musicas::table.find(track.to_string()))
          .set(musicas::nome_musica.eq(name))
          .execute(conn)
          .map_err(map_err)?;
        expect_one(affected)
      })
      .await
  }

  async fn update_genre(&self, release: ReleaseId, genre: &str) -> Result<(), StoreError> {
    let genre = genre.to_string();
    self
      .run(move |conn| {
        let affected = diesel::update(criacao::table.find(release.to_string()))
          .set(criacao::genre.eq(genre))
          .execute(conn)
          .map_err(map_err)?;
        expect_one(affected)
      })
      .await
  }

  async fn find_release(&self, release: ReleaseId) -> Result<Option<Release>, StoreError> {
    self
      .run(move |conn| {
        criacao::table
          .find(release.to_string())
          .select(ReleaseRow::as_select())
          .first(conn)
          .optional()
          .map_err(map_err)?
          .map(row_to_release)
          .transpose()
      })
      .await
  }

  async fn find_album_by_release(&self, release: ReleaseId) -> Result<Option<Album>, StoreError> {
    self
      .run(move |conn| {
        albums::table
          .filter(albums::criacao_id.eq(release.to_string()))
          .select(AlbumRow::as_select())
          .first(conn)
          .optional()
          .map_err(map_err)?
          .map(row_to_album)
          .transpose()
      })
      .await
  }

  async fn list_tracks(&self, release: ReleaseId) -> Result<Vec<Track>, StoreError> {
    self
      .run(move |conn| {
        musicas::table
          .filter(musicas::criacao_id.eq(release.to_string()))
          .order(rowid())
          .select(TrackRow::as_select())
          .load(conn)
          .map_err(map_err)?
          .into_iter()
          .map(row_to_track)
          .collect()
      })
      .await
  }

  async fn list_works(&self, user: UserId) -> Result<Vec<Work>, StoreError> {
    self
      .run(move |conn| {
        let releases: Vec<ReleaseRow> = criacao::table
          .filter(criacao::user_id.eq(user.to_string()))
          .order((criacao::created_at.desc(), rowid().desc()))
          .select(ReleaseRow::as_select())
          .load(conn)
          .map_err(map_err)?;

        let ids: Vec<String> = releases.iter().map(|r| r.id.clone()).collect();

        let mut album_names: HashMap<String, String> = albums::table
          .filter(albums::criacao_id.eq_any(ids.clone()))
          .select(AlbumRow::as_select())
          .load(conn)
          .map_err(map_err)?
          .into_iter()
          .map(|a| (a.criacao_id, a.nome_album))
          .collect();

        let mut track_names: HashMap<String, Vec<String>> = HashMap::new();
        let tracks: Vec<TrackRow> = musicas::table
          .filter(musicas::criacao_id.eq_any(ids))
          .order(rowid())
          .select(TrackRow::as_select())
          .load(conn)
          .map_err(map_err)?;
        for t in tracks {
          track_names.entry(t.criacao_id).or_default().push(t.nome_musica);
        }

        releases
          .into_iter()
          .map(|row| {
            let album_name = album_names.remove(&row.id);
            let track_names = track_names.remove(&row.id).unwrap_or_default();
            Ok(Work { release: row_to_release(row)?, album_name, track_names })
          })
          .collect()
      })
      .await
  }
}

#[async_trait]
impl ProfileStore for SqliteStore {
  async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
    self
      .run(move |conn| {
        let row = NewProfileRow { id: profile.id.to_string(), email: &profile.email, nome: &profile.name };
        let inserted = diesel::insert_into(perfil::table)
          .values(&row)
          .returning(ProfileRow::as_returning())
          .get_result(conn)
          .map_err(map_err)?;
        row_to_profile(inserted)
      })
      .await
  }

  async fn find_profile(&self, user: UserId) -> Result<Option<Profile>, StoreError> {
    self
      .run(move |conn| {
        perfil::table
          .find(user.to_string())
          .select(ProfileRow::as_select())
          .first(conn)
          .optional()
          .map_err(map_err)?
          .map(row_to_profile)
          .transpose()
      })
      .await
  }

  async fn set_profile_photo(&self, user: UserId, photo_url: &str) -> Result<(), StoreError> {
    let photo_url = photo_url.to_string();
    self
      .run(move |conn| {
        let affected = diesel::update(perfil::table.find(user.to_string()))
          .set(perfil::foto.eq(Some(photo_url)))
          .execute(conn)
          .map_err(map_err)?;
        expect_one(affected)
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use estudio_core::domain::{MediaFile, PublishRequest, ReleaseKind, ReleaseMetadata, TrackDraft};
  use estudio_core::services::{CatalogService, PublisherConfig, ReleasePublisher};
  use estudio_fs::FsBlobStore;
  use pretty_assertions::assert_eq;
  use tempfile::tempdir;
  use tokio_util::sync::CancellationToken;

  async fn store_with_profile() -> (SqliteStore, UserId) {
    let store = SqliteStore::in_memory().unwrap();
    let user = UserId::new();
    store
      .insert_profile(NewProfile { id: user, email: "ana@example.com".into(), name: "Ana".into() })
      .await
      .unwrap();
    (store, user)
  }

  fn new_release(user: UserId, kind: ReleaseKind) -> NewRelease {
    NewRelease {
      user_id: user,
      artist_name: "Ana".into(),
      kind,
      genre: "MPB".into(),
      release_date: Some("2024-03-01".into()),
      image_url: None,
    }
  }

  #[tokio::test]
  async fn test_profile_roundtrip() {
    let (store, user) = store_with_profile().await;

    store.set_profile_photo(user, "file:///fotos-perfil/a.jpg").await.unwrap();
    let profile = store.find_profile(user).await.unwrap().unwrap();

    assert_eq!(profile.name, "Ana");
    assert_eq!(profile.photo_url.as_deref(), Some("file:///fotos-perfil/a.jpg"));
    assert_eq!(store.find_profile(UserId::new()).await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_duplicate_profile_is_constraint() {
    let (store, user) = store_with_profile().await;
    let err = store
      .insert_profile(NewProfile { id: user, email: "x@example.com".into(), name: "X".into() })
      .await
      .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)), "{err:?}");
  }

  #[tokio::test]
  async fn test_updates_on_missing_rows_are_not_found() {
    let store = SqliteStore::in_memory().unwrap();
    assert_eq!(store.set_profile_photo(UserId::new(), "x").await, Err(StoreError::NotFound));
    assert_eq!(store.update_genre(ReleaseId::new(), "Rock").await, Err(StoreError::NotFound));
    assert_eq!(store.rename_album(ReleaseId::new(), "X").await, Err(StoreError::NotFound));
    assert_eq!(store.link_album(ReleaseId::new(), None).await, Err(StoreError::NotFound));
  }

  #[tokio::test]
  async fn test_album_release_graph() {
    let (store, user) = store_with_profile().await;

    let release = store.insert_release(new_release(user, ReleaseKind::Album)).await.unwrap();
    assert_eq!(release.album_id, None);
    assert!(release.created_at.ends_with('Z'));

    let album = store.insert_album(NewAlbum { name: "Noites".into(), release_id: release.id }).await.unwrap();
    store.link_album(release.id, Some(album.id)).await.unwrap();

    let tracks = store
      .insert_tracks(vec![
        NewTrack { name: "Um".into(), release_id: release.id, audio_url: "u1".into() },
        NewTrack { name: "Dois".into(), release_id: release.id, audio_url: "u2".into() },
      ])
      .await
      .unwrap();

    let found = store.find_release(release.id).await.unwrap().unwrap();
    assert_eq!(found.album_id, Some(album.id));
    assert_eq!(found.kind, ReleaseKind::Album);
    assert_eq!(store.find_album_by_release(release.id).await.unwrap(), Some(album));
    assert_eq!(store.list_tracks(release.id).await.unwrap(), tracks);
  }

  #[tokio::test]
  async fn test_linked_album_cannot_be_deleted() {
    let (store, user) = store_with_profile().await;
    let release = store.insert_release(new_release(user, ReleaseKind::Ep)).await.unwrap();
    let album = store.insert_album(NewAlbum { name: "EP".into(), release_id: release.id }).await.unwrap();
    store.link_album(release.id, Some(album.id)).await.unwrap();

    let err = store.delete_albums_by_release(release.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)), "{err:?}");

    store.link_album(release.id, None).await.unwrap();
    assert_eq!(store.delete_albums_by_release(release.id).await.unwrap(), 1);
    assert_eq!(store.delete_release(release.id).await.unwrap(), 1);
    assert_eq!(store.delete_release(release.id).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_link_to_unknown_album_is_rejected() {
    let (store, user) = store_with_profile().await;
    let release = store.insert_release(new_release(user, ReleaseKind::Album)).await.unwrap();

    let err = store.link_album(release.id, Some(AlbumId::new())).await.unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)), "{err:?}");
  }

  #[tokio::test]
  async fn test_list_works_newest_first() {
    let (store, user) = store_with_profile().await;

    let first = store.insert_release(new_release(user, ReleaseKind::Single)).await.unwrap();
    store
      .insert_tracks(vec![NewTrack { name: "Chuva".into(), release_id: first.id, audio_url: "a".into() }])
      .await
      .unwrap();

    let second = store.insert_release(new_release(user, ReleaseKind::Album)).await.unwrap();
    let album = store.insert_album(NewAlbum { name: "Noites".into(), release_id: second.id }).await.unwrap();
    store.link_album(second.id, Some(album.id)).await.unwrap();

    let works = store.list_works(user).await.unwrap();
    let titles: Vec<String> = works.iter().map(|w| w.display_title()).collect();

    assert_eq!(titles, vec!["Noites".to_string(), "Chuva".to_string()]);
    assert_eq!(works[1].track_names, vec!["Chuva".to_string()]);
    assert!(store.list_works(UserId::new()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_publish_and_delete_against_sqlite_and_fs() {
    let tmp = tempdir().unwrap();
    let (store, user) = store_with_profile().await;
    let blobs = FsBlobStore::new(tmp.path(), "file:///media");

    let publisher =
      ReleasePublisher::new(store.clone(), store.clone(), blobs.clone(), PublisherConfig::default());
    let request = PublishRequest {
      kind: ReleaseKind::Album,
      metadata: ReleaseMetadata {
        name: "Noites".into(),
        genre: "MPB".into(),
        release_date: None,
        cover: Some(MediaFile::new("capa.png", b"png".to_vec())),
      },
      tracks: vec![
        TrackDraft::new("Um", Some(MediaFile::new("1.mp3", b"one".to_vec()))),
        TrackDraft::new("", Some(MediaFile::new("skip.mp3", b"x".to_vec()))),
        TrackDraft::new("Dois", Some(MediaFile::new("2.mp3", b"two".to_vec()))),
      ],
    };

    let published = publisher.publish(Some(user), request, &CancellationToken::new()).await.unwrap();
    assert_eq!(published.tracks.len(), 2);
    assert_eq!(store.list_tracks(published.release.id).await.unwrap(), published.tracks);
    assert_eq!(std::fs::read_dir(tmp.path().join("musicas").join(user.to_string())).unwrap().count(), 2);

    let catalog = CatalogService::new(store.clone(), blobs);
    catalog.delete_release(Some(user), published.release.id).await.unwrap();

    assert!(store.list_works(user).await.unwrap().is_empty());
    assert_eq!(std::fs::read_dir(tmp.path().join("musicas").join(user.to_string())).unwrap().count(), 0);
    assert_eq!(std::fs::read_dir(tmp.path().join("albums")).unwrap().count(), 0);
  }
}
