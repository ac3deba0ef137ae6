use crate::core::cache::CacheStore;
use crate::domain::model::{Aggregation, PostalCode, SkippedEntry};
use crate::domain::ports::Storage;

/// Best-effort concatenation of cached result arrays. A bad entry is skipped, never fatal.
pub struct Aggregator<S: Storage> {
    cache: CacheStore<S>,
}

impl<S: Storage> Aggregator<S> {
    pub fn new(cache: CacheStore<S>) -> Self {
        Self { cache }
    }

    /// Appends one entry's records, or notes it as skipped.
    pub async fn append(&self, code: &PostalCode, aggregation: &mut Aggregation) {
        match self.cache.read(code).await {
            Ok(records) => aggregation.records.extend(records),
            Err(e) => {
                tracing::warn!(
                    "Error loading data from {}: {}",
                    code.cache_file_name(),
                    e
                );
                aggregation.skipped.push(SkippedEntry {
                    postal_code: code.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    pub async fn load(&self, codes: &[PostalCode]) -> Aggregation {
        let mut aggregation = Aggregation::default();
        for code in codes {
            self.append(code, &mut aggregation).await;
        }

        tracing::info!(
            "Loaded {} physicians from {} cache entries ({} skipped)",
            aggregation.records.len(),
            codes.len() - aggregation.skipped.len(),
            aggregation.skipped.len()
        );
        aggregation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::domain::model::PhysicianRecord;
    use serde_json::json;
    use tempfile::TempDir;

    fn code(s: &str) -> PostalCode {
        PostalCode::parse(s).unwrap()
    }

    fn aggregator(dir: &TempDir) -> Aggregator<LocalStorage> {
        Aggregator::new(CacheStore::new(
            LocalStorage::new(dir.path().to_str().unwrap()),
            None,
        ))
    }

    #[tokio::test]
    async fn test_concatenates_in_input_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("00601.json"), r#"[{"number":"1"}]"#).unwrap();
        std::fs::write(dir.path().join("00602.json"), r#"[{"number":"2"},{"number":"3"}]"#).unwrap();

        let result = aggregator(&dir).load(&[code("00602"), code("00601")]).await;

        assert!(result.skipped.is_empty());
        assert_eq!(
            result.records,
            vec![
                PhysicianRecord(json!({"number": "2"})),
                PhysicianRecord(json!({"number": "3"})),
                PhysicianRecord(json!({"number": "1"})),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_corrupt_and_non_array_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("00601.json"), r#"[{"number":"1"}]"#).unwrap();
        std::fs::write(dir.path().join("00602.json"), "[{").unwrap();
        std::fs::write(dir.path().join("00603.json"), r#"{"results":[]}"#).unwrap();

        let result = aggregator(&dir)
            .load(&[code("00601"), code("00602"), code("00603"), code("00604")])
            .await;

        assert_eq!(result.records.len(), 1);
        let skipped: Vec<&str> = result.skipped.iter().map(|s| s.postal_code.as_str()).collect();
        assert_eq!(skipped, vec!["00602", "00603", "00604"]);
    }

    #[tokio::test]
    async fn test_empty_input_is_empty_output() {
        let dir = TempDir::new().unwrap();
        let result = aggregator(&dir).load(&[]).await;
        assert!(result.records.is_empty());
        assert!(result.skipped.is_empty());
    }
}
