use crate::config::toml_config::{PartitionConfig, ResourceConfig};
use crate::domain::model::{DataType, OutputRecord};
use crate::utils::error::{EtlError, Result};

/// One output resource: metadata plus the records that go into its CSV.
#[derive(Debug, Clone)]
pub struct ResourcePlan {
    pub name: String,
    pub description: String,
    pub filename: String,
    pub records: Vec<OutputRecord>,
}

/// Everything needed to materialize one data type's output.
#[derive(Debug, Clone)]
pub struct DataTypePlan {
    pub data_type: DataType,
    pub year_start: i32,
    pub year_end: i32,
    pub resources: Vec<ResourcePlan>,
}

/// Consecutive windows aligned to multiples of `window` covering
/// [year_start, year_end], most recent first.
pub fn year_windows(year_start: i32, year_end: i32, window: i32) -> Vec<(i32, i32)> {
    let mut windows = Vec::new();
    let mut sy = year_start - year_start.rem_euclid(window);
    while sy <= year_end {
        windows.push((sy, sy + window - 1));
        sy += window;
    }
    windows.reverse();
    windows
}

/// Partitions a data type's records into output resources. Returnee output is
/// one resource over the whole year range; refugee output is one resource per
/// year window, walked most-recent-first. Fails with `EmptyDataType` when no
/// row was ever classified into the data type.
pub fn plan_resources(
    data_type: DataType,
    records: &[OutputRecord],
    years: &[i32],
    resource: &ResourceConfig,
    partition: &PartitionConfig,
) -> Result<DataTypePlan> {
    let year_start = years
        .iter()
        .min()
        .copied()
        .ok_or(EtlError::EmptyDataType { data_type })?;
    let year_end = years
        .iter()
        .max()
        .copied()
        .ok_or(EtlError::EmptyDataType { data_type })?;

    if !data_type.is_partitioned() {
        return Ok(DataTypePlan {
            data_type,
            year_start,
            year_end,
            resources: vec![ResourcePlan {
                name: resource.name.clone(),
                description: resource.description.clone(),
                filename: resource.filename.clone(),
                records: records.to_vec(),
            }],
        });
    }

    let mut resources = Vec::new();
    for (sy, ey) in year_windows(year_start, year_end, partition.window_years) {
        let window_records: Vec<OutputRecord> = records
            .iter()
            .filter(|r| sy <= r.year && r.year <= ey)
            .cloned()
            .collect();

        if window_records.is_empty() && !partition.emit_empty_windows {
            tracing::debug!("Skipping empty {}-{} window for {}", sy, ey, data_type);
            continue;
        }

        let year_range = format!("{}-{}", sy, ey);
        resources.push(ResourcePlan {
            name: resource.name.replace("YYYY", &year_range),
            description: resource.description.replace("YYYY", &year_range),
            filename: resource.filename.replace("YYYY", &year_range.replace('-', "_")),
            records: window_records,
        });
    }

    Ok(DataTypePlan {
        data_type,
        year_start,
        year_end,
        resources,
    })
}
