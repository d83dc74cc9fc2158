use crate::adapters::retriever::Retriever;
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;

/// Dataset metadata as returned by a CKAN-style `package_show` call.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resources: Vec<ResourceInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl DatasetInfo {
    pub fn resource_named(&self, name: &str) -> Option<&ResourceInfo> {
        self.resources.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Deserialize)]
struct PackageShowResponse {
    success: bool,
    result: Option<DatasetInfo>,
}

/// Thin metadata client for the source catalog.
pub struct HdxClient<'a> {
    retriever: &'a Retriever,
    base_url: String,
}

impl<'a> HdxClient<'a> {
    pub fn new(retriever: &'a Retriever, base_url: &str) -> Self {
        Self {
            retriever,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn read_dataset(&self, name: &str) -> Result<DatasetInfo> {
        let url = format!("{}/api/3/action/package_show?id={}", self.base_url, name);
        let response: PackageShowResponse = self
            .retriever
            .fetch_json(&url, &format!("dataset-{}.json", name))
            .await?;

        match response.result {
            Some(dataset) if response.success => Ok(dataset),
            _ => Err(EtlError::ProcessingError {
                message: format!("Catalog lookup for dataset '{}' failed", name),
            }),
        }
    }
}
