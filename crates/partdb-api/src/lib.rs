pub mod client;
pub mod partdb;
pub mod records;

pub use client::{ApiClient, ApiClientBuilder, ApiError, RetryPolicy};
pub use partdb::{PartDb, PartSource};
pub use records::{ApiRecord, Category, InventoryPart, PartLot, Project, RecordError, Storage};

/// Placeholder shown before the user has configured their own instance.
pub const DEFAULT_API_URL: &str = "https://partdb.example.com/api";

/// Base URL used when nothing else is configured; `PARTDB_API_URL` wins if set.
pub fn default_api_url() -> String {
    std::env::var("PARTDB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}
