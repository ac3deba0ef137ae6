use crate::config::toml_config::LocatorConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "physician-locator")]
#[command(about = "Look up physicians by metro area from the NPI registry, with a local cache")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, env = "PHYSICIAN_LOCATOR_CONFIG", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "MSA to ZIP reference table (CSV with MSA, ZIP, Addr columns)")]
    pub reference: Option<String>,

    #[arg(long, global = true, help = "Directory holding one JSON file per postal code")]
    pub cache_dir: Option<String>,

    #[arg(long, global = true, help = "Concurrent registry requests")]
    pub workers: Option<usize>,

    #[arg(long, global = true, help = "Directory for per-run log files")]
    pub log_dir: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Resolve a metro (MSA code or name), fetch missing postal codes and combine the results
    Locate {
        metro: String,

        #[arg(long, help = "Write the combined records as a JSON array")]
        output: Option<PathBuf>,

        #[arg(long, help = "Write a flat CSV of name, organization, specialties and address")]
        csv: Option<PathBuf>,
    },
    /// Fetch every postal code in the reference table
    CacheAll,
    /// List metro names in the reference table
    Metros,
    /// Show cache entries with their fetch time and integrity
    CacheStatus,
}

impl CliConfig {
    /// File settings (or defaults) with command-line overrides applied on top.
    pub fn resolve_config(&self) -> Result<LocatorConfig> {
        let mut config = match &self.config {
            Some(path) => LocatorConfig::from_file(path)?,
            None => LocatorConfig::default(),
        };

        if let Some(reference) = &self.reference {
            config.reference.path = reference.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache.directory = cache_dir.clone();
        }
        if let Some(workers) = self.workers {
            config.fanout.workers = workers;
        }
        if let Some(log_dir) = &self.log_dir {
            config.logging.directory = log_dir.clone();
        }

        Ok(config)
    }
}
