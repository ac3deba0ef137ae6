use crate::adapters::http::RegistryClient;
use crate::adapters::reference::ZipTable;
use crate::core::aggregator::Aggregator;
use crate::core::cache::{CacheEntryStatus, CacheStore};
use crate::core::fanout::CacheBuilder;
use crate::core::fetcher::PhysicianFetcher;
use crate::core::resolver::ZipResolver;
use crate::core::retry::RetryPolicy;
use crate::domain::model::{
    Aggregation, FetchOutcome, FetchReport, FetchStatus, MetroQuery, PhysicianRecord, PostalCode,
};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::Result;
use crate::utils::progress::FetchProgress;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct LocateResult {
    pub query: MetroQuery,
    pub postal_codes: Vec<PostalCode>,
    pub report: FetchReport,
    pub aggregation: Aggregation,
}

impl LocateResult {
    pub fn records(&self) -> &[PhysicianRecord] {
        &self.aggregation.records
    }
}

/// Resolve → fan-out fetch → aggregate. Every collaborator is handed in by the caller.
pub struct LocatorPipeline<S: Storage> {
    resolver: ZipResolver,
    fetcher: PhysicianFetcher<S>,
    aggregator: Aggregator<S>,
    workers: usize,
    progress: FetchProgress,
}

impl<S: Storage + Clone> LocatorPipeline<S> {
    pub fn new(
        table: ZipTable,
        storage: S,
        client: RegistryClient,
        retry: RetryPolicy,
        max_age: Option<chrono::Duration>,
        workers: usize,
    ) -> Self {
        let cache = CacheStore::new(storage, max_age);
        Self {
            resolver: ZipResolver::new(table),
            fetcher: PhysicianFetcher::new(cache.clone(), client, retry),
            aggregator: Aggregator::new(cache),
            workers,
            progress: FetchProgress::default(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C, table: ZipTable, storage: S) -> Result<Self> {
        Ok(Self::new(
            table,
            storage,
            RegistryClient::from_config(config)?,
            RetryPolicy::from_config(config),
            config.cache_max_age(),
            config.workers(),
        ))
    }
}

impl<S: Storage> LocatorPipeline<S> {
    pub fn with_progress(mut self, progress: FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Records come back in resolver (table) order; in-memory records from unpersisted
    /// fetches sit where their postal code would have been.
    pub async fn locate(&self, query: &MetroQuery) -> LocateResult {
        let postal_codes = self.resolver.resolve(query);
        let report = self.build_cache(&postal_codes).await;

        let outcomes: HashMap<&PostalCode, &FetchOutcome> = report
            .outcomes
            .iter()
            .map(|o| (&o.postal_code, o))
            .collect();
        let mut seen = HashSet::new();
        let mut aggregation = Aggregation::default();

        for code in postal_codes.iter().filter(|c| seen.insert(*c)) {
            let Some(outcome) = outcomes.get(code) else {
                continue;
            };
            match outcome.status {
                FetchStatus::CacheHit | FetchStatus::Fetched => {
                    self.aggregator.append(code, &mut aggregation).await;
                }
                FetchStatus::FetchedNotPersisted { .. } => {
                    aggregation.records.extend(outcome.records.iter().cloned());
                }
                FetchStatus::Failed { .. } => {}
            }
        }

        tracing::info!(
            "Loaded {} physicians for {} ({} entries skipped)",
            aggregation.records.len(),
            query,
            aggregation.skipped.len()
        );

        LocateResult {
            query: query.clone(),
            postal_codes,
            report,
            aggregation,
        }
    }

    pub async fn build_cache(&self, codes: &[PostalCode]) -> FetchReport {
        CacheBuilder::new(&self.fetcher, self.workers)
            .build(codes, &self.progress)
            .await
    }

    /// Fetches every postal code in the reference table.
    pub async fn cache_all(&self) -> FetchReport {
        let codes = self.resolver.all_postal_codes();
        self.build_cache(&codes).await
    }

    pub async fn cache_status(&self) -> Result<Vec<CacheEntryStatus>> {
        self.fetcher.cache().inspect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    const TABLE: &str = "\
MSA,ZIP,Addr
21940,601,\"Aguadilla-Isabela, PR\"
21940,602,\"Aguadilla-Isabela, PR\"
14460,2108,\"Boston-Cambridge-Newton, MA-NH\"
";

    fn pipeline(server: &MockServer, dir: &TempDir) -> LocatorPipeline<LocalStorage> {
        LocatorPipeline::new(
            ZipTable::from_reader(TABLE.as_bytes()).unwrap(),
            LocalStorage::new(dir.path().to_str().unwrap()),
            RegistryClient::new(reqwest::Client::new(), &server.url("/api/"), "2.1", 20),
            RetryPolicy::no_retry(),
            None,
            4,
        )
    }

    #[tokio::test]
    async fn test_locate_combines_cached_and_fetched_records() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/").query_param("postal_code", "00602");
            then.status(200).json_body(json!({"results": [{"number": "2"}]}));
        });
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("00601.json"), r#"[{"number":"1"}]"#).unwrap();

        let result = pipeline(&server, &dir).locate(&MetroQuery::parse("21940")).await;

        api_mock.assert_hits(1);
        assert_eq!(result.postal_codes.len(), 2);
        assert_eq!(result.report.cache_hits(), 1);
        assert_eq!(result.report.fetched(), 1);
        assert_eq!(result.records().len(), 2);
    }

    #[tokio::test]
    async fn test_locate_unknown_metro_is_empty() {
        let server = MockServer::start();
        let dir = TempDir::new().unwrap();

        let result = pipeline(&server, &dir).locate(&MetroQuery::parse("atlantis")).await;

        assert!(result.postal_codes.is_empty());
        assert!(result.report.outcomes.is_empty());
        assert!(result.records().is_empty());
    }

    #[tokio::test]
    async fn test_cache_all_covers_whole_table() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/");
            then.status(200).json_body(json!({"results": []}));
        });
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&server, &dir);

        let report = pipeline.cache_all().await;

        api_mock.assert_hits(3);
        assert_eq!(report.fetched(), 3);
        assert_eq!(pipeline.cache_status().await.unwrap().len(), 3);
    }

    const UNSORTED_TABLE: &str = "\
MSA,ZIP,Addr
21940,602,\"Aguadilla-Isabela, PR\"
21940,601,\"Aguadilla-Isabela, PR\"
21940,602,\"Aguadilla-Isabela, PR\"
";

    fn unsorted_pipeline(server: &MockServer, cache_root: &std::path::Path) -> LocatorPipeline<LocalStorage> {
        LocatorPipeline::new(
            ZipTable::from_reader(UNSORTED_TABLE.as_bytes()).unwrap(),
            LocalStorage::new(cache_root.to_str().unwrap()),
            RegistryClient::new(reqwest::Client::new(), &server.url("/api/"), "2.1", 20),
            RetryPolicy::no_retry(),
            None,
            4,
        )
    }

    fn numbers(result: &LocateResult) -> Vec<String> {
        result
            .records()
            .iter()
            .filter_map(|r| r.npi())
            .collect()
    }

    #[tokio::test]
    async fn test_locate_keeps_table_order() {
        let server = MockServer::start();
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("00601.json"), r#"[{"number":"from-601"}]"#).unwrap();
        std::fs::write(dir.path().join("00602.json"), r#"[{"number":"from-602"}]"#).unwrap();

        let result = unsorted_pipeline(&server, dir.path())
            .locate(&MetroQuery::Code(21940))
            .await;

        let resolved: Vec<&str> = result.postal_codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(resolved, vec!["00602", "00601", "00602"]);
        assert_eq!(numbers(&result), vec!["from-602", "from-601"]);
    }

    #[tokio::test]
    async fn test_locate_keeps_records_when_cache_is_unwritable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/").query_param("postal_code", "00601");
            then.status(200).json_body(json!({"results": [{"number": "from-601"}]}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/").query_param("postal_code", "00602");
            then.status(200).json_body(json!({"results": [{"number": "from-602"}]}));
        });
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = unsorted_pipeline(&server, &blocker.join("cache"))
            .locate(&MetroQuery::Code(21940))
            .await;

        assert_eq!(result.report.not_persisted(), 2);
        assert!(result.aggregation.skipped.is_empty());
        assert_eq!(numbers(&result), vec!["from-602", "from-601"]);
    }
}
