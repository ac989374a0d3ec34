pub mod genres;
pub mod ids;
pub mod media;
pub mod profile;
pub mod publish;
pub mod release;
pub mod release_kind;
pub mod work;

pub use ids::{AlbumId, ReleaseId, TrackId, UserId};
pub use media::{BlobKey, Bucket, MediaFile, WriteMode};
pub use profile::{NewProfile, Profile};
pub use publish::{PublishRequest, ReleaseMetadata, TrackDraft};
pub use release::{Album, NewAlbum, NewRelease, NewTrack, PublishedRelease, Release, Track};
pub use release_kind::ReleaseKind;
pub use work::Work;
