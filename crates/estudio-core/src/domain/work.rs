use serde::{Deserialize, Serialize};

use crate::domain::release::Release;

/// Vista de lectura de "mis obras": un lanzamiento con sus nombres ya resueltos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
  pub release: Release,
  pub album_name: Option<String>,
  pub track_names: Vec<String>,
}

impl Work {
  /// Título a mostrar.
  ///
  /// Nombre del álbum si existe; si no, el nombre de la única pista;
  /// en último caso, la etiqueta del tipo.
  pub fn display_title(&self) -> String {
    if let Some(name) = &self.album_name {
      return name.clone();
    }

    match self.track_names.as_slice() {
      [only] => only.clone(),
      _ => self.release.kind.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ids::{ReleaseId, UserId};
  use crate::domain::release_kind::ReleaseKind;
  use pretty_assertions::assert_eq;

  fn release(kind: ReleaseKind) -> Release {
    Release {
      id: ReleaseId::new(),
      user_id: UserId::new(),
      artist_name: "Ana".into(),
      kind,
      genre: "MPB".into(),
      release_date: None,
      image_url: None,
      album_id: None,
      created_at: "2024-01-01T00:00:00".into(),
    }
  }

  #[test]
  fn test_display_title_prefers_album_name() {
    let work = Work {
      release: release(ReleaseKind::Album),
      album_name: Some("Noites".into()),
      track_names: vec!["a".into()],
    };
    assert_eq!(work.display_title(), "Noites");
  }

  #[test]
  fn test_display_title_uses_single_track() {
    let work =
      Work { release: release(ReleaseKind::Single), album_name: None, track_names: vec!["Chuva".into()] };
    assert_eq!(work.display_title(), "Chuva");
  }

  #[test]
  fn test_display_title_falls_back_to_kind() {
    let work = Work { release: release(ReleaseKind::Podcast), album_name: None, track_names: vec![] };
    assert_eq!(work.display_title(), "Podcast");
  }
}
