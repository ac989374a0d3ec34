use tracing::instrument;

use crate::domain::{BlobKey, Bucket, MediaFile, NewProfile, Profile, UserId, WriteMode};
use crate::errors::CoreError;
use crate::ports::{BlobStore, ProfileStore};

pub struct ProfileService<P, B>
where
  P: ProfileStore,
  B: BlobStore,
{
  profiles: P,
  blobs: B,
}

impl<P, B> ProfileService<P, B>
where
  P: ProfileStore,
  B: BlobStore,
{
  pub fn new(profiles: P, blobs: B) -> Self {
    Self { profiles, blobs }
  }

  /// Crea el perfil de una identidad recién registrada en el proveedor externo.
  #[instrument(skip(self, profile), fields(user = %profile.id))]
  pub async fn register(&self, profile: NewProfile) -> Result<Profile, CoreError> {
    let profile =
      profile.normalized().map_err(|field| CoreError::Validation(format!("{field} is required")))?;
    Ok(self.profiles.insert_profile(profile).await?)
  }

  pub async fn profile(&self, user: Option<UserId>) -> Result<Profile, CoreError> {
    let user = user.ok_or(CoreError::Unauthenticated)?;
    self.profiles.find_profile(user).await?.ok_or(CoreError::NotFound)
  }

  /// Sube la foto a `<user>.<ext>` sobrescribiendo la anterior y guarda su URL.
  #[instrument(skip(self, photo), fields(file = %photo.file_name))]
  pub async fn update_photo(&self, user: Option<UserId>, photo: MediaFile) -> Result<Profile, CoreError> {
    let mut profile = self.profile(user).await?;
    if photo.is_empty() {
      return Err(CoreError::Validation("photo must not be empty".into()));
    }

    let key = BlobKey::profile_photo(profile.id, &photo.extension());
    self.blobs.upload(Bucket::ProfilePhotos, &key, &photo.bytes, WriteMode::Overwrite).await?;

    let url = self.blobs.public_url(Bucket::ProfilePhotos, &key);
    self.profiles.set_profile_photo(profile.id, &url).await?;
    profile.photo_url = Some(url);

    Ok(profile)
  }
}
