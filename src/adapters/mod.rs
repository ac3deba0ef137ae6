// Adapters layer: concrete implementations for external systems.

pub mod http;
pub mod reference;
pub mod storage;

pub use http::RegistryClient;
pub use reference::{ReferenceRow, ZipTable};
pub use storage::LocalStorage;
