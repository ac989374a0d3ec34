use crate::schema::{albums, criacao, musicas, perfil};

use diesel::prelude::*;

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = perfil)]
pub struct ProfileRow {
  pub id: String,
  pub email: String,
  pub nome: String,
  pub foto: Option<String>,
  pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = perfil)]
pub struct NewProfileRow<'a> {
  pub id: String,
  pub email: &'a str,
  pub nome: &'a str,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = criacao)]
pub struct ReleaseRow {
  pub id: String,
  pub user_id: String,
  pub nome_artista: String,
  pub tipo: String,
  pub genre: String,
  pub release_date: Option<String>,
  pub image_url: Option<String>,
  pub album_id: Option<String>,
  pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = criacao)]
pub struct NewReleaseRow<'a> {
  pub id: String,
  pub user_id: String,
  pub nome_artista: &'a str,
  pub tipo: &'static str,
  pub genre: &'a str,
  pub release_date: Option<&'a str>,
  pub image_url: Option<&'a str>,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = albums)]
pub struct AlbumRow {
  pub id: String,
  pub nome_album: String,
  pub criacao_id: String,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = musicas)]
pub struct TrackRow {
  pub id: String,
  pub criacao_id: String,
  pub nome_musica: String,
  pub audio_url: String,
}
