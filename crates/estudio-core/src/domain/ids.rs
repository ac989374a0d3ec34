use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Declara un identificador opaco respaldado por un UUID.
///
/// Todos los IDs del dominio comparten la misma forma: se generan con
/// UUID v4 en el adapter de persistencia y se guardan como texto.
macro_rules! uuid_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(Uuid);

    impl $name {
      /// Genera un nuevo identificador único.
      pub fn new() -> Self {
        $name(Uuid::new_v4())
      }

      pub fn from_uuid(u: Uuid) -> Self {
        $name(u)
      }

      pub fn as_uuid(&self) -> Uuid {
        self.0
      }
    }

    impl Default for $name {
      fn default() -> Self {
        Self::new()
      }
    }

    impl From<Uuid> for $name {
      fn from(u: Uuid) -> Self {
        $name(u)
      }
    }

    impl From<$name> for Uuid {
      fn from(id: $name) -> Self {
        id.0
      }
    }

    impl FromStr for $name {
      type Err = uuid::Error;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map($name)
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
      }
    }
  };
}

uuid_id! {
  /// Usuario autenticado por el proveedor de identidad externo.
  ///
  /// Coincide con el `id` de la fila de perfil.
  UserId
}

uuid_id! {
  /// Identificador de un lanzamiento (`criacao`).
  ReleaseId
}

uuid_id! {
  /// Identificador de un álbum. Solo existe para lanzamientos álbum/EP.
  AlbumId
}

uuid_id! {
  /// Identificador de una pista (`musicas`).
  TrackId
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_id_roundtrips_through_text() {
    let id = ReleaseId::new();
    let parsed: ReleaseId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
  }

  #[test]
  fn test_id_rejects_garbage() {
    assert!("not-a-uuid".parse::<TrackId>().is_err());
  }
}
