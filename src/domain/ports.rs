use crate::domain::model::{ExtractResult, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Country classification service: ISO3 code to HRP / GHO membership.
/// `None` means the code is unknown to the classification data.
pub trait CountryLookup: Send + Sync {
    fn hrp_status(&self, iso3: &str) -> Option<bool>;
    fn gho_status(&self, iso3: &str) -> Option<bool>;
}

impl<T: CountryLookup + ?Sized> CountryLookup for Arc<T> {
    fn hrp_status(&self, iso3: &str) -> Option<bool> {
        (**self).hrp_status(iso3)
    }

    fn gho_status(&self, iso3: &str) -> Option<bool> {
        (**self).gho_status(iso3)
    }
}

/// Sink for non-fatal conditions found while processing. Implementations
/// deduplicate and report after the run completes; nothing here aborts a pass.
pub trait ErrorSink: Send + Sync {
    fn add_message(&self, component: &str, dataset: &str, message: &str);
    fn add_missing_value(&self, component: &str, dataset: &str, category: &str, value: &str);
}

impl<T: ErrorSink + ?Sized> ErrorSink for Arc<T> {
    fn add_message(&self, component: &str, dataset: &str, message: &str) {
        (**self).add_message(component, dataset, message)
    }

    fn add_missing_value(&self, component: &str, dataset: &str, category: &str, value: &str) {
        (**self).add_missing_value(component, dataset, category, value)
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractResult>;
    async fn transform(&self, extracted: ExtractResult) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<Vec<String>>;
}
