pub mod catalog_service;
pub mod profile_service;
pub mod release_publisher;
mod saga;

pub use catalog_service::CatalogService;
pub use profile_service::ProfileService;
pub use release_publisher::{PublisherConfig, ReleasePublisher};
