use crate::domain::{NewProfile, Profile, UserId};
use crate::ports::release_store::StoreError;

/// Port de perfiles. La identidad (contraseñas, sesiones) vive fuera;
/// aquí solo se guarda lo que el estudio muestra.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
  async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError>;
  async fn find_profile(&self, user: UserId) -> Result<Option<Profile>, StoreError>;
  async fn set_profile_photo(&self, user: UserId, photo_url: &str) -> Result<(), StoreError>;
}
