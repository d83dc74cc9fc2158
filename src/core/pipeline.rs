use crate::adapters::hdx::HdxClient;
use crate::adapters::retriever::Retriever;
use crate::config::TomlConfig;
use crate::core::aggregate::aggregate;
use crate::core::classify::Classifier;
use crate::core::partition::plan_resources;
use crate::core::resource::{dataset_descriptor, render_csv};
use crate::domain::model::{DataType, ExtractResult, RawTable, SourceInfo, TransformResult};
use crate::domain::ports::{CountryLookup, ErrorSink, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};

/// The refugees/returnees pipeline: downloads the source CSV identified by
/// catalog metadata, reshapes it into classified output records, and writes
/// one CSV resource per configured partition plus a dataset descriptor.
pub struct HapiPipeline<S: Storage, L: CountryLookup, E: ErrorSink> {
    storage: S,
    config: TomlConfig,
    retriever: Retriever,
    lookup: L,
    errors: E,
}

impl<S: Storage, L: CountryLookup, E: ErrorSink> HapiPipeline<S, L, E> {
    pub fn new(storage: S, config: TomlConfig, retriever: Retriever, lookup: L, errors: E) -> Self {
        Self {
            storage,
            config,
            retriever,
            lookup,
            errors,
        }
    }

    fn filename_from_url(url: &str) -> &str {
        let without_query = url.split('?').next().unwrap_or(url);
        without_query
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("source.csv")
    }
}

#[async_trait::async_trait]
impl<S: Storage, L: CountryLookup, E: ErrorSink> Pipeline for HapiPipeline<S, L, E> {
    async fn extract(&self) -> Result<ExtractResult> {
        let client = HdxClient::new(&self.retriever, &self.config.source.base_url);
        let dataset = client.read_dataset(&self.config.source.dataset).await?;
        let resource = dataset
            .resource_named(&self.config.source.resource)
            .ok_or_else(|| EtlError::ResourceNotFound {
                dataset: dataset.name.clone(),
                resource: self.config.source.resource.clone(),
            })?;

        tracing::debug!("Source resource url: {}", resource.url);
        let path = self
            .retriever
            .download_file(&resource.url, Self::filename_from_url(&resource.url))
            .await?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut headers = Vec::new();
        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let fields: Vec<String> = record.iter().map(str::to_string).collect();
            match index {
                0 => headers = fields,
                1 => {} // sub-header/units row
                _ => rows.push(fields),
            }
        }

        if headers.is_empty() {
            return Err(EtlError::ProcessingError {
                message: "Source CSV is empty".to_string(),
            });
        }

        Ok(ExtractResult {
            table: RawTable { headers, rows },
            source: SourceInfo {
                dataset_id: dataset.id.clone(),
                dataset_name: dataset.name.clone(),
                resource_id: resource.id.clone(),
            },
        })
    }

    async fn transform(&self, extracted: ExtractResult) -> Result<TransformResult> {
        let aggregated = aggregate(&extracted.table)?;
        tracing::debug!(
            "Aggregated {} raw rows into {} groups ({} population columns)",
            extracted.table.rows.len(),
            aggregated.rows.len(),
            aggregated.population_headers.len()
        );

        let mut classifier = Classifier::new(
            &self.config.pipeline.name,
            &extracted.source.dataset_name,
            &self.lookup,
            &self.errors,
        );
        let result = classifier.classify(&aggregated, &extracted.source)?;

        for data_type in DataType::ALL {
            let count = result.data.get(&data_type).map(Vec::len).unwrap_or(0);
            tracing::info!("Classified {} {} records", count, data_type);
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<Vec<String>> {
        let mut outputs = Vec::new();

        for data_type in DataType::ALL {
            let records = result.data.get(&data_type).map(Vec::as_slice).unwrap_or(&[]);
            let years = result.years.get(&data_type).map(Vec::as_slice).unwrap_or(&[]);

            let plan = match plan_resources(
                data_type,
                records,
                years,
                self.config.resources.get(data_type),
                &self.config.partition,
            ) {
                Ok(plan) => plan,
                Err(EtlError::EmptyDataType { data_type }) => {
                    // fatal for this data type's output only, not for the run
                    tracing::error!("No {} rows classified; skipping its output", data_type);
                    self.errors.add_message(
                        &self.config.pipeline.name,
                        &result.source.dataset_name,
                        &format!("No rows classified as {}", data_type),
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            for resource in &plan.resources {
                let data = render_csv(&self.config.hxl_tags, &resource.records)?;
                self.storage.write_file(&resource.filename, &data).await?;
                tracing::info!(
                    "Wrote {} ({} records)",
                    resource.filename,
                    resource.records.len()
                );
                outputs.push(resource.filename.clone());
            }

            let descriptor = dataset_descriptor(self.config.datasets.get(data_type), &plan)?;
            let descriptor_file = format!("{}_dataset.json", data_type);
            self.storage
                .write_file(&descriptor_file, &serde_json::to_vec_pretty(&descriptor)?)
                .await?;
            outputs.push(descriptor_file);
        }

        if outputs.is_empty() {
            return Err(EtlError::ProcessingError {
                message: "No rows were classified into any known data type".to_string(),
            });
        }

        Ok(outputs)
    }
}
