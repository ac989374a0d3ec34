use serde::{Deserialize, Serialize};

use crate::domain::ids::UserId;

/// Perfil público de un usuario (fila `perfil`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id: UserId,
  pub email: String,
  /// Nombre artístico; se copia a cada lanzamiento.
  pub name: String,
  pub photo_url: Option<String>,
}

/// Alta de perfil para una identidad ya creada por el proveedor externo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
  pub id: UserId,
  pub email: String,
  pub name: String,
}

impl NewProfile {
  /// Devuelve una copia recortada, o el nombre del primer campo vacío.
  pub fn normalized(&self) -> Result<NewProfile, &'static str> {
    let email = self.email.trim();
    let name = self.name.trim();

    if email.is_empty() {
      return Err("email");
    }
    if name.is_empty() {
      return Err("name");
    }

    Ok(NewProfile { id: self.id, email: email.to_string(), name: name.to_string() })
  }
}
