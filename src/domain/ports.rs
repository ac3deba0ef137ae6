use crate::utils::error::Result;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
    /// File names directly under the storage root.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn registry_endpoint(&self) -> &str;
    fn registry_version(&self) -> &str;
    fn page_limit(&self) -> u32;
    fn request_timeout(&self) -> Duration;
    fn cache_dir(&self) -> &str;
    /// `None` means a cache entry never goes stale.
    fn cache_max_age(&self) -> Option<chrono::Duration>;
    fn reference_path(&self) -> &str;
    fn workers(&self) -> usize;
    fn retry_max_attempts(&self) -> u32;
    fn retry_base_delay(&self) -> Duration;
    fn retry_max_delay(&self) -> Duration;
}
