pub mod metrics;
pub mod providers;
pub mod request_builder;
pub mod staging;

pub use providers::{ModelProvider, ProviderError, ProviderOutput};
pub use staging::{StagedUpload, UploadStager};
