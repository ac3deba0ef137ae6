use crate::adapters::http::RegistryClient;
use crate::core::cache::CacheStore;
use crate::core::retry::RetryPolicy;
use crate::domain::model::{FetchOutcome, FetchStatus, PostalCode};
use crate::domain::ports::Storage;

/// Cache-first lookup of one postal code's physicians.
pub struct PhysicianFetcher<S: Storage> {
    cache: CacheStore<S>,
    client: RegistryClient,
    retry: RetryPolicy,
}

impl<S: Storage> PhysicianFetcher<S> {
    pub fn new(cache: CacheStore<S>, client: RegistryClient, retry: RetryPolicy) -> Self {
        Self {
            cache,
            client,
            retry,
        }
    }

    pub fn cache(&self) -> &CacheStore<S> {
        &self.cache
    }

    pub async fn fetch(&self, code: &PostalCode) -> FetchOutcome {
        match self.cache.is_fresh(code).await {
            Ok(true) => match self.cache.read(code).await {
                Ok(records) => {
                    tracing::info!("Cache hit for {} ({} records)", code, records.len());
                    return FetchOutcome {
                        postal_code: code.clone(),
                        status: FetchStatus::CacheHit,
                        records,
                        attempts: 0,
                    };
                }
                Err(e) => {
                    tracing::warn!("Cache entry for {} is unreadable, refetching: {}", code, e);
                }
            },
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Could not check cache for {}: {}", code, e);
            }
        }

        let label = format!("Registry request for {}", code);
        let client = &self.client;
        let (result, attempts) = self.retry.run(&label, move || client.search(code)).await;

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Request failed for {} after {} attempt(s): {}", code, attempts, e);
                return FetchOutcome {
                    postal_code: code.clone(),
                    status: FetchStatus::Failed {
                        reason: e.to_string(),
                    },
                    records: Vec::new(),
                    attempts,
                };
            }
        };

        let status = match self.cache.write(code, &records).await {
            Ok(meta) => {
                tracing::info!(
                    "Cached {} records for {} (sha256 {})",
                    meta.record_count,
                    code,
                    &meta.sha256[..12]
                );
                FetchStatus::Fetched
            }
            Err(e) => {
                tracing::error!("Error writing cache entry for {}: {}", code, e);
                FetchStatus::FetchedNotPersisted {
                    reason: e.to_string(),
                }
            }
        };

        FetchOutcome {
            postal_code: code.clone(),
            status,
            records,
            attempts,
        }
    }
}
