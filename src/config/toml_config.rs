use crate::adapters::http::{DEFAULT_PAGE_LIMIT, DEFAULT_REGISTRY_ENDPOINT, DEFAULT_REGISTRY_VERSION};
use crate::core::fanout::DEFAULT_WORKERS;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LocatorError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// About a century; keeps `cache.max_age_hours` well inside `chrono::Duration`'s range.
pub const MAX_CACHE_AGE_HOURS: i64 = 876_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub registry: RegistryConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub reference: ReferenceConfig,
    pub fanout: FanoutConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub endpoint: String,
    pub version: String,
    pub limit: u32,
    pub timeout_seconds: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REGISTRY_ENDPOINT.to_string(),
            version: DEFAULT_REGISTRY_VERSION.to_string(),
            limit: DEFAULT_PAGE_LIMIT,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub directory: String,
    /// Unset keeps entries forever.
    pub max_age_hours: Option<i64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: "./physicians".to_string(),
            max_age_hours: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub path: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            path: "./data/msa_to_zip.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    pub workers: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "./logs".to_string(),
        }
    }
}

impl LocatorConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LocatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LocatorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references with environment values; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("registry.endpoint", &self.registry.endpoint)?;
        validation::validate_non_empty_string("registry.version", &self.registry.version)?;
        validation::validate_range("registry.limit", self.registry.limit, 1, 200)?;
        validation::validate_positive_number(
            "registry.timeout_seconds",
            self.registry.timeout_seconds as usize,
            1,
        )?;
        validation::validate_range("retry.max_attempts", self.retry.max_attempts, 1, 10)?;
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(LocatorError::InvalidConfigValueError {
                field: "retry.base_delay_ms".to_string(),
                value: self.retry.base_delay_ms.to_string(),
                reason: "must not exceed retry.max_delay_ms".to_string(),
            });
        }
        validation::validate_path("cache.directory", &self.cache.directory)?;
        if let Some(hours) = self.cache.max_age_hours {
            validation::validate_range("cache.max_age_hours", hours, 1, MAX_CACHE_AGE_HOURS)?;
        }
        validation::validate_path("reference.path", &self.reference.path)?;
        validation::validate_positive_number("fanout.workers", self.fanout.workers, 1)?;
        validation::validate_path("logging.directory", &self.logging.directory)?;
        Ok(())
    }
}

impl ConfigProvider for LocatorConfig {
    fn registry_endpoint(&self) -> &str {
        &self.registry.endpoint
    }

    fn registry_version(&self) -> &str {
        &self.registry.version
    }

    fn page_limit(&self) -> u32 {
        self.registry.limit
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.timeout_seconds)
    }

    fn cache_dir(&self) -> &str {
        &self.cache.directory
    }

    fn cache_max_age(&self) -> Option<chrono::Duration> {
        self.cache
            .max_age_hours
            .filter(|hours| (1..=MAX_CACHE_AGE_HOURS).contains(hours))
            .map(chrono::Duration::hours)
    }

    fn reference_path(&self) -> &str {
        &self.reference.path
    }

    fn workers(&self) -> usize {
        self.fanout.workers
    }

    fn retry_max_attempts(&self) -> u32 {
        self.retry.max_attempts
    }

    fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry.base_delay_ms)
    }

    fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry.max_delay_ms)
    }
}

impl Validate for LocatorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = LocatorConfig::from_toml_str("").unwrap();

        assert_eq!(config.registry_endpoint(), "https://npiregistry.cms.hhs.gov/api/");
        assert_eq!(config.registry_version(), "2.1");
        assert_eq!(config.page_limit(), 20);
        assert_eq!(config.workers(), 10);
        assert_eq!(config.cache_max_age(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml_content = r#"
[registry]
limit = 50

[cache]
directory = "/var/cache/physicians"
max_age_hours = 72

[fanout]
workers = 4
"#;

        let config = LocatorConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.page_limit(), 50);
        assert_eq!(config.registry_version(), "2.1");
        assert_eq!(config.cache_dir(), "/var/cache/physicians");
        assert_eq!(config.cache_max_age(), Some(chrono::Duration::hours(72)));
        assert_eq!(config.workers(), 4);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LOCATOR_TEST_REGISTRY", "http://127.0.0.1:9000/api/");

        let toml_content = r#"
[registry]
endpoint = "${LOCATOR_TEST_REGISTRY}"
"#;

        let config = LocatorConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.registry.endpoint, "http://127.0.0.1:9000/api/");

        std::env::remove_var("LOCATOR_TEST_REGISTRY");
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = LocatorConfig::from_toml_str("[registry]\nendpoint = \"invalid-url\"\n").unwrap();
        assert!(bad_endpoint.validate().is_err());

        let no_workers = LocatorConfig::from_toml_str("[fanout]\nworkers = 0\n").unwrap();
        assert!(no_workers.validate().is_err());

        let inverted_delays =
            LocatorConfig::from_toml_str("[retry]\nbase_delay_ms = 5000\nmax_delay_ms = 10\n").unwrap();
        assert!(inverted_delays.validate().is_err());
    }

    #[test]
    fn test_cache_max_age_is_bounded() {
        let huge = LocatorConfig::from_toml_str("[cache]\nmax_age_hours = 3000000000000000\n").unwrap();
        assert!(huge.validate().is_err());
        assert_eq!(huge.cache_max_age(), None);

        let zero = LocatorConfig::from_toml_str("[cache]\nmax_age_hours = 0\n").unwrap();
        assert!(zero.validate().is_err());

        let week = LocatorConfig::from_toml_str("[cache]\nmax_age_hours = 168\n").unwrap();
        assert!(week.validate().is_ok());
        assert_eq!(week.cache_max_age(), Some(chrono::Duration::hours(168)));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[reference]\npath = \"./fixtures/msa.csv\"\n")
            .unwrap();

        let config = LocatorConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.reference_path(), "./fixtures/msa.csv");
    }
}
