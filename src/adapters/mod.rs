// Adapters layer: concrete implementations for external systems
// (storage, HTTP retrieval, catalog metadata, country classification).

pub mod country;
pub mod hdx;
pub mod retriever;
pub mod sink;
pub mod storage;
