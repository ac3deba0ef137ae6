use crate::domain::model::{CacheMetadata, PhysicianRecord, PostalCode};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use chrono::Utc;
use sha2::{Digest, Sha256};

/// Outcome of comparing a data file against the digest in its sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    Verified,
    Mismatch,
    /// No readable sidecar, e.g. a file seeded by hand.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct CacheEntryStatus {
    pub postal_code: PostalCode,
    pub metadata: Option<CacheMetadata>,
    pub integrity: Integrity,
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// One `{zip}.json` data file per postal code holding the registry's `results` array verbatim,
/// plus an optional `{zip}.meta.json` sidecar.
#[derive(Debug, Clone)]
pub struct CacheStore<S: Storage> {
    storage: S,
    max_age: Option<chrono::Duration>,
}

impl<S: Storage> CacheStore<S> {
    pub fn new(storage: S, max_age: Option<chrono::Duration>) -> Self {
        Self { storage, max_age }
    }

    pub async fn contains(&self, code: &PostalCode) -> Result<bool> {
        self.storage.exists(&code.cache_file_name()).await
    }

    pub async fn metadata(&self, code: &PostalCode) -> Option<CacheMetadata> {
        let bytes = self
            .storage
            .read_file(&code.metadata_file_name())
            .await
            .ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("Ignoring unreadable metadata for {}: {}", code, e);
                None
            }
        }
    }

    /// A present entry is fresh unless a max age is set and its sidecar says it is older.
    /// Entries without a sidecar are always fresh.
    pub async fn is_fresh(&self, code: &PostalCode) -> Result<bool> {
        if !self.contains(code).await? {
            return Ok(false);
        }
        let Some(max_age) = self.max_age else {
            return Ok(true);
        };
        match self.metadata(code).await {
            Some(meta) => Ok(Utc::now() - meta.fetched_at <= max_age),
            None => Ok(true),
        }
    }

    pub async fn read(&self, code: &PostalCode) -> Result<Vec<PhysicianRecord>> {
        let bytes = self.storage.read_file(&code.cache_file_name()).await?;
        let records = serde_json::from_slice(&bytes)?;
        Ok(records)
    }

    pub async fn write(
        &self,
        code: &PostalCode,
        records: &[PhysicianRecord],
    ) -> Result<CacheMetadata> {
        let data = serde_json::to_vec(records)?;
        self.storage.write_file(&code.cache_file_name(), &data).await?;

        let metadata = CacheMetadata {
            postal_code: code.clone(),
            fetched_at: Utc::now(),
            record_count: records.len(),
            sha256: sha256_hex(&data),
        };
        self.storage
            .write_file(
                &code.metadata_file_name(),
                &serde_json::to_vec_pretty(&metadata)?,
            )
            .await?;

        Ok(metadata)
    }

    pub async fn verify(&self, code: &PostalCode) -> Result<Integrity> {
        let Some(metadata) = self.metadata(code).await else {
            return Ok(Integrity::Unknown);
        };
        let data = self.storage.read_file(&code.cache_file_name()).await?;
        if sha256_hex(&data) == metadata.sha256 {
            Ok(Integrity::Verified)
        } else {
            Ok(Integrity::Mismatch)
        }
    }

    /// Every data file in the cache with its sidecar and integrity check.
    pub async fn inspect(&self) -> Result<Vec<CacheEntryStatus>> {
        let mut entries = Vec::new();

        for name in self.storage.list().await? {
            if name.ends_with(".meta.json") {
                continue;
            }
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            let Ok(postal_code) = PostalCode::parse(stem) else {
                tracing::debug!("Ignoring stray cache file {}", name);
                continue;
            };

            let integrity = self.verify(&postal_code).await?;
            let metadata = self.metadata(&postal_code).await;
            entries.push(CacheEntryStatus {
                postal_code,
                metadata,
                integrity,
            });
        }

        Ok(entries)
    }
}
