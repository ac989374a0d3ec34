pub mod blob_store;
pub mod config;

pub use blob_store::FsBlobStore;
pub use config::MediaConfig;
