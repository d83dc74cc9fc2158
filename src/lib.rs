pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::country::HdxCountryLookup;
pub use adapters::retriever::Retriever;
pub use adapters::sink::CollectingErrorSink;
pub use adapters::storage::LocalStorage;
pub use config::TomlConfig;
pub use crate::core::{etl::EtlEngine, pipeline::HapiPipeline};
pub use utils::error::{EtlError, Result};
