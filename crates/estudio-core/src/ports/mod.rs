pub mod blob_store;
pub mod profile_store;
pub mod release_store;

pub use blob_store::{BlobError, BlobStore};
pub use profile_store::ProfileStore;
pub use release_store::{ReleaseStore, StoreError};
