use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Tipo de lanzamiento que se puede publicar desde el estudio.
///
/// El tipo decide la rama del flujo de publicación:
/// - `Album` y `Ep` crean una fila de álbum y aceptan varias pistas.
/// - `Single` y `Podcast` publican exactamente una pista y nunca crean álbum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
  Album,
  Ep,
  Single,
  Podcast,
}

/// Error al interpretar un tipo de lanzamiento desconocido.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown release kind: {input}")]
pub struct ReleaseKindParseError {
  pub input: String,
}

impl ReleaseKind {
  pub const ALL: [ReleaseKind; 4] =
    [ReleaseKind::Album, ReleaseKind::Ep, ReleaseKind::Single, ReleaseKind::Podcast];

  /// `true` para los tipos que agrupan sus pistas en un álbum.
  pub fn requires_album(self) -> bool {
    matches!(self, ReleaseKind::Album | ReleaseKind::Ep)
  }

  /// Valor persistido en la columna `tipo`.
  pub fn as_str(self) -> &'static str {
    match self {
      ReleaseKind::Album => "album",
      ReleaseKind::Ep => "ep",
      ReleaseKind::Single => "single",
      ReleaseKind::Podcast => "podcast",
    }
  }
}

impl FromStr for ReleaseKind {
  type Err = ReleaseKindParseError;

  /// Acepta los nombres canónicos y las etiquetas que muestra el estudio
  /// ("Álbum", "Música Single"...), sin distinguir mayúsculas.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_lowercase();

    let kind = match normalized.as_str() {
      "album" | "álbum" => ReleaseKind::Album,
      "ep" => ReleaseKind::Ep,
      "single" | "música single" | "musica single" => ReleaseKind::Single,
      "podcast" => ReleaseKind::Podcast,
      _ => return Err(ReleaseKindParseError { input: s.to_string() }),
    };

    Ok(kind)
  }
}

impl fmt::Display for ReleaseKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseKind::Album => write!(f, "Álbum"),
      ReleaseKind::Ep => write!(f, "EP"),
      ReleaseKind::Single => write!(f, "Single"),
      ReleaseKind::Podcast => write!(f, "Podcast"),
    }
  }
}
