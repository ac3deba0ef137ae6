pub mod aggregator;
pub mod cache;
pub mod export;
pub mod fanout;
pub mod fetcher;
pub mod pipeline;
pub mod resolver;
pub mod retry;

pub use crate::domain::model::{
    Aggregation, FetchOutcome, FetchReport, FetchStatus, MetroQuery, PhysicianRecord, PostalCode,
};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
