pub mod artifact_store;
pub mod csv_dataset;
pub mod observability;
pub mod repositories;

pub use artifact_store::FsArtifactStore;
pub use csv_dataset::CsvDatasetSource;
pub use repositories::InMemoryArtifactStore;
