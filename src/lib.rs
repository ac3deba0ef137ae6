pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::LocatorConfig;

pub use adapters::{LocalStorage, RegistryClient, ZipTable};
pub use core::pipeline::{LocateResult, LocatorPipeline};
pub use core::retry::RetryPolicy;
pub use domain::model::{FetchReport, FetchStatus, MetroQuery, PhysicianRecord, PostalCode};
pub use utils::error::{LocatorError, Result};
