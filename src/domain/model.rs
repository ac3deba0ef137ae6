use crate::utils::error::{LocatorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A metro identifier as typed by the user: a numeric MSA code or a free-text name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetroQuery {
    Code(u32),
    Name(String),
}

impl MetroQuery {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<u32>() {
            Ok(code) => MetroQuery::Code(code),
            Err(_) => MetroQuery::Name(trimmed.to_string()),
        }
    }
}

impl fmt::Display for MetroQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetroQuery::Code(code) => write!(f, "MSA {}", code),
            MetroQuery::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// Five-digit, zero-padded ZIP code. Used as the cache key and in cache file names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.len() > 5 {
            return Err(LocatorError::InvalidPostalCode {
                value: value.to_string(),
                reason: "expected 1 to 5 digits".to_string(),
            });
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LocatorError::InvalidPostalCode {
                value: value.to_string(),
                reason: "only digits are allowed".to_string(),
            });
        }
        Ok(Self(format!("{:0>5}", trimmed)))
    }

    pub fn from_number(value: u32) -> Result<Self> {
        if value > 99_999 {
            return Err(LocatorError::InvalidPostalCode {
                value: value.to_string(),
                reason: "more than 5 digits".to_string(),
            });
        }
        Ok(Self(format!("{:05}", value)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn cache_file_name(&self) -> String {
        format!("{}.json", self.0)
    }

    pub fn metadata_file_name(&self) -> String {
        format!("{}.meta.json", self.0)
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = LocatorError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}

/// One registry result, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicianRecord(pub serde_json::Value);

impl PhysicianRecord {
    fn basic_field(&self, key: &str) -> &str {
        self.0
            .get("basic")
            .and_then(|basic| basic.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }

    fn joined_name(&self, first: &str, middle: &str, last: &str) -> String {
        [
            self.basic_field(first),
            self.basic_field(middle),
            self.basic_field(last),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn npi(&self) -> Option<String> {
        match self.0.get("number")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Authorized official's name for organizations, otherwise the individual's name.
    pub fn full_name(&self) -> String {
        let official = self.joined_name(
            "authorized_official_first_name",
            "authorized_official_middle_name",
            "authorized_official_last_name",
        );
        if !official.is_empty() {
            return official;
        }
        self.joined_name("first_name", "middle_name", "last_name")
    }

    pub fn organization_name(&self) -> Option<String> {
        let name = self.basic_field("organization_name");
        (!name.is_empty()).then(|| name.to_string())
    }

    pub fn display_name(&self) -> String {
        self.organization_name().unwrap_or_else(|| self.full_name())
    }

    pub fn specialties(&self) -> String {
        let descriptions: Vec<&str> = self
            .0
            .get("taxonomies")
            .and_then(|t| t.as_array())
            .map(|taxonomies| {
                taxonomies
                    .iter()
                    .filter_map(|t| t.get("desc").and_then(|d| d.as_str()))
                    .filter(|d| !d.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if descriptions.is_empty() {
            "<unknown>".to_string()
        } else {
            descriptions.join(", ")
        }
    }

    /// Practice location formatted as `address_1, city, state postal`.
    pub fn location_address(&self) -> Option<String> {
        let location = self
            .0
            .get("addresses")?
            .as_array()?
            .iter()
            .find(|a| a.get("address_purpose").and_then(|p| p.as_str()) == Some("LOCATION"))?;
        let field = |key: &str| {
            location
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        let formatted = format!(
            "{}, {}, {} {}",
            field("address_1"),
            field("city"),
            field("state"),
            field("postal_code")
        );
        Some(formatted.trim().to_string())
    }
}

/// Sidecar written next to each cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub postal_code: PostalCode,
    pub fetched_at: DateTime<Utc>,
    pub record_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    CacheHit,
    Fetched,
    /// Registry answered but the cache write failed; records are only held in memory.
    FetchedNotPersisted { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub postal_code: PostalCode,
    pub status: FetchStatus,
    pub records: Vec<PhysicianRecord>,
    pub attempts: u32,
}

impl FetchOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self.status, FetchStatus::CacheHit | FetchStatus::Fetched)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, FetchStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub outcomes: Vec<FetchOutcome>,
}

impl FetchReport {
    fn count(&self, pred: impl Fn(&FetchStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn cache_hits(&self) -> usize {
        self.count(|s| matches!(s, FetchStatus::CacheHit))
    }

    pub fn fetched(&self) -> usize {
        self.count(|s| matches!(s, FetchStatus::Fetched))
    }

    pub fn not_persisted(&self) -> usize {
        self.count(|s| matches!(s, FetchStatus::FetchedNotPersisted { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FetchStatus::Failed { .. }))
    }

    pub fn network_attempts(&self) -> u32 {
        self.outcomes.iter().map(|o| o.attempts).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub postal_code: PostalCode,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub records: Vec<PhysicianRecord>,
    pub skipped: Vec<SkippedEntry>,
}
