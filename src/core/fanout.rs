use crate::core::fetcher::PhysicianFetcher;
use crate::domain::model::{FetchReport, PostalCode};
use crate::domain::ports::Storage;
use crate::utils::progress::FetchProgress;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;

pub const DEFAULT_WORKERS: usize = 10;

/// Drives the fetcher over many postal codes with at most `workers` requests in flight.
pub struct CacheBuilder<'a, S: Storage> {
    fetcher: &'a PhysicianFetcher<S>,
    workers: usize,
}

impl<'a, S: Storage> CacheBuilder<'a, S> {
    pub fn new(fetcher: &'a PhysicianFetcher<S>, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
        }
    }

    /// Every distinct code gets exactly one outcome; the report is sorted by postal code.
    pub async fn build(&self, codes: &[PostalCode], progress: &FetchProgress) -> FetchReport {
        let mut seen = HashSet::new();
        let unique: Vec<&PostalCode> = codes.iter().filter(|c| seen.insert(*c)).collect();

        tracing::info!(
            "Total ZIP codes to process: {} ({} workers)",
            unique.len(),
            self.workers
        );
        progress.start(unique.len(), "Caching physicians");

        let mut outcomes: Vec<_> = stream::iter(unique)
            .map(|code| async move {
                let outcome = self.fetcher.fetch(code).await;
                progress.advance();
                outcome
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        progress.finish();
        outcomes.sort_by(|a, b| a.postal_code.cmp(&b.postal_code));

        let report = FetchReport { outcomes };
        tracing::info!(
            "Finished caching: {} cache hits, {} fetched, {} not persisted, {} failed",
            report.cache_hits(),
            report.fetched(),
            report.not_persisted(),
            report.failed()
        );
        report
    }
}
