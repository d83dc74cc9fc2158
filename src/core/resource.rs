use crate::config::toml_config::{DatasetConfig, HxlColumn};
use crate::core::classify::reference_period;
use crate::core::partition::DataTypePlan;
use crate::domain::model::OutputRecord;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Renders records as UTF-8 CSV with a byte-order mark: headers on the first
/// line, HXL tags on the second, then one line per record. Column order comes
/// from the configured `hxl_tags`.
pub fn render_csv(columns: &[HxlColumn], records: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.header.as_str()))?;
    writer.write_record(columns.iter().map(|c| c.tag.as_str()))?;

    for record in records {
        let mut fields = Vec::with_capacity(columns.len());
        for column in columns {
            let value = record
                .field(&column.header)
                .ok_or_else(|| EtlError::ProcessingError {
                    message: format!("Unknown output column '{}'", column.header),
                })?;
            fields.push(value);
        }
        writer.write_record(&fields)?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("CSV writer: {}", e),
        })?;

    let mut data = Vec::with_capacity(UTF8_BOM.len() + body.len());
    data.extend_from_slice(UTF8_BOM);
    data.extend_from_slice(&body);
    Ok(data)
}

/// Metadata emitted next to the CSVs, mirroring what the upstream catalog
/// expects when the files are uploaded.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetDescriptor {
    pub name: String,
    pub title: String,
    pub dataset_date: String,
    pub tags: Vec<String>,
    pub locations: Vec<String>,
    pub resources: Vec<ResourceDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub description: String,
    pub format: String,
    pub filename: String,
}

pub fn dataset_descriptor(config: &DatasetConfig, plan: &DataTypePlan) -> Result<DatasetDescriptor> {
    let (start, _) = reference_period(plan.year_start)?;
    let (_, end) = reference_period(plan.year_end)?;

    Ok(DatasetDescriptor {
        name: config.name.clone(),
        title: config.title.clone(),
        dataset_date: format!("[{} TO {}]", start, end),
        tags: config.tags.clone(),
        locations: vec!["world".to_string()],
        resources: plan
            .resources
            .iter()
            .map(|r| ResourceDescriptor {
                name: r.name.clone(),
                description: r.description.clone(),
                format: "csv".to_string(),
                filename: r.filename.clone(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DataType, Gender};

    fn columns() -> Vec<HxlColumn> {
        vec![
            HxlColumn {
                header: "origin_location_code".to_string(),
                tag: "#origin+code".to_string(),
            },
            HxlColumn {
                header: "gender".to_string(),
                tag: "#gender+code".to_string(),
            },
            HxlColumn {
                header: "population".to_string(),
                tag: "#population".to_string(),
            },
            HxlColumn {
                header: "min_age".to_string(),
                tag: "#age+min".to_string(),
            },
        ]
    }

    fn record() -> OutputRecord {
        OutputRecord {
            origin_location_code: "AFG".to_string(),
            origin_has_hrp: Some(true),
            origin_in_gho: Some(true),
            asylum_location_code: "PAK".to_string(),
            asylum_has_hrp: Some(false),
            asylum_in_gho: Some(false),
            population_group: "REF".to_string(),
            gender: Gender::Female,
            age_range: "all".to_string(),
            min_age: None,
            max_age: None,
            population: 42,
            reference_period_start: "2020-01-01T00:00:00".to_string(),
            reference_period_end: "2020-12-31T23:59:59".to_string(),
            dataset_hdx_id: "ds".to_string(),
            resource_hdx_id: "rs".to_string(),
            warning: None,
            error: None,
            year: 2020,
        }
    }

    #[test]
    fn test_render_csv_layout() {
        let data = render_csv(&columns(), &[record()]).unwrap();

        assert!(data.starts_with(b"\xef\xbb\xbf"));
        let text = String::from_utf8(data[3..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "origin_location_code,gender,population,min_age");
        assert_eq!(lines[1], "#origin+code,#gender+code,#population,#age+min");
        assert_eq!(lines[2], "AFG,f,42,");
    }

    #[test]
    fn test_render_csv_is_deterministic() {
        let records = vec![record(), record()];
        let first = render_csv(&columns(), &records).unwrap();
        let second = render_csv(&columns(), &records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dataset_descriptor_date_range() {
        let plan = DataTypePlan {
            data_type: DataType::Returnees,
            year_start: 2020,
            year_end: 2023,
            resources: vec![],
        };
        let config = DatasetConfig {
            name: "hdx-hapi-returnees".to_string(),
            title: "Returnees".to_string(),
            tags: vec!["returnees".to_string()],
        };

        let descriptor = dataset_descriptor(&config, &plan).unwrap();
        assert_eq!(
            descriptor.dataset_date,
            "[2020-01-01T00:00:00 TO 2023-12-31T23:59:59]"
        );
        assert_eq!(descriptor.locations, vec!["world"]);
    }
}
