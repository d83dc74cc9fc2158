use crate::domain::model::{DataType, OutputRecord};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub countries: CountriesConfig,
    pub load: LoadConfig,
    #[serde(default)]
    pub partition: PartitionConfig,
    pub datasets: PerDataType<DatasetConfig>,
    pub resources: PerDataType<ResourceConfig>,
    pub hxl_tags: Vec<HxlColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

/// Where the source CSV lives: a dataset on a CKAN-style catalog, identified
/// by dataset name plus resource name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub dataset: String,
    pub resource: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountriesConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    #[serde(default = "default_window_years")]
    pub window_years: i32,
    #[serde(default = "default_emit_empty_windows")]
    pub emit_empty_windows: bool,
}

fn default_window_years() -> i32 {
    5
}

fn default_emit_empty_windows() -> bool {
    true
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            window_years: default_window_years(),
            emit_empty_windows: default_emit_empty_windows(),
        }
    }
}

/// One value per output data type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerDataType<T> {
    pub refugees: T,
    pub returnees: T,
}

impl<T> PerDataType<T> {
    pub fn get(&self, data_type: DataType) -> &T {
        match data_type {
            DataType::Refugees => &self.refugees,
            DataType::Returnees => &self.returnees,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub title: String,
    pub tags: Vec<String>,
}

/// Resource metadata templates. For partitioned data types the literal
/// `YYYY` token is replaced with the window label (`2020-2024` in names and
/// descriptions, `2020_2024` in filenames).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    pub description: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HxlColumn {
    pub header: String,
    pub tag: String,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` tokens with environment variable values.
    /// Unset variables are left untouched so validation can flag them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ProcessingError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("source.base_url", &self.source.base_url)?;
        validate_non_empty_string("source.dataset", &self.source.dataset)?;
        validate_non_empty_string("source.resource", &self.source.resource)?;
        validate_url("countries.url", &self.countries.url)?;
        validate_path("load.output_path", &self.load.output_path)?;
        validate_positive_number("partition.window_years", self.partition.window_years, 1)?;

        if self.hxl_tags.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "hxl_tags".to_string(),
            });
        }
        for column in &self.hxl_tags {
            if !OutputRecord::KNOWN_HEADERS.contains(&column.header.as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "hxl_tags".to_string(),
                    value: column.header.clone(),
                    reason: "Unknown output column".to_string(),
                });
            }
        }

        for data_type in DataType::ALL {
            let dataset = self.datasets.get(data_type);
            validate_non_empty_string("datasets.name", &dataset.name)?;
            validate_non_empty_string("datasets.title", &dataset.title)?;

            let resource = self.resources.get(data_type);
            validate_non_empty_string("resources.filename", &resource.filename)?;
            if data_type.is_partitioned() && !resource.filename.contains("YYYY") {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("resources.{}.filename", data_type),
                    value: resource.filename.clone(),
                    reason: "Partitioned output needs a YYYY token to keep filenames unique"
                        .to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn output_path(&self) -> &str {
        &self.load.output_path
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
