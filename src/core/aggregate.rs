use crate::domain::model::{AggregatedRow, AggregatedTable, RawTable};
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;

pub const YEAR_HEADER: &str = "Year";
pub const ORIGIN_HEADER: &str = "Country of Origin Code";
pub const ASYLUM_HEADER: &str = "Country of Asylum Code";
pub const POPULATION_GROUP_HEADER: &str = "Population Type";

/// Population count columns are named "Female", "Male" or "Total", optionally
/// followed by an age qualifier.
pub fn is_population_header(header: &str) -> bool {
    let first = header.split(' ').next().unwrap_or("");
    first.eq_ignore_ascii_case("female")
        || first.eq_ignore_ascii_case("male")
        || first.eq_ignore_ascii_case("total")
}

pub fn population_headers(headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .filter(|h| is_population_header(h))
        .cloned()
        .collect()
}

fn header_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| EtlError::ProcessingError {
            message: format!("Source CSV is missing the '{}' column", name),
        })
}

fn parse_count(value: &str) -> i64 {
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }
    value
        .parse::<i64>()
        .or_else(|_| value.parse::<f64>().map(|f| f as i64))
        .unwrap_or(0)
}

/// Groups the raw table by (year, origin, asylum, population group), summing
/// every population column across duplicate rows. The source contains
/// overlapping records per key; classification must see de-duplicated totals.
/// Group order and key column values follow the first row encountered per key.
pub fn aggregate(table: &RawTable) -> Result<AggregatedTable> {
    let year_idx = header_index(&table.headers, YEAR_HEADER)?;
    let origin_idx = header_index(&table.headers, ORIGIN_HEADER)?;
    let asylum_idx = header_index(&table.headers, ASYLUM_HEADER)?;
    let group_idx = header_index(&table.headers, POPULATION_GROUP_HEADER)?;

    let population_headers = population_headers(&table.headers);
    let population_indices: Vec<usize> = population_headers
        .iter()
        .map(|h| header_index(&table.headers, h))
        .collect::<Result<_>>()?;

    let mut rows: Vec<AggregatedRow> = Vec::new();
    let mut index: HashMap<(i32, String, String, String), usize> = HashMap::new();

    for (row_number, row) in table.rows.iter().enumerate() {
        let field = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        let year = match field(year_idx).trim().parse::<i32>() {
            Ok(year) => year,
            Err(_) => {
                tracing::warn!(
                    "Skipping row {}: unparseable year '{}'",
                    row_number + 1,
                    field(year_idx)
                );
                continue;
            }
        };

        let key = (
            year,
            field(origin_idx).to_string(),
            field(asylum_idx).to_string(),
            field(group_idx).to_string(),
        );

        let row_idx = match index.get(&key) {
            Some(&existing) => existing,
            None => {
                rows.push(AggregatedRow {
                    year,
                    origin_code: key.1.clone(),
                    asylum_code: key.2.clone(),
                    population_group: key.3.clone(),
                    populations: vec![0; population_indices.len()],
                });
                index.insert(key, rows.len() - 1);
                rows.len() - 1
            }
        };

        for (slot, &col_idx) in population_indices.iter().enumerate() {
            rows[row_idx].populations[slot] += parse_count(field(col_idx));
        }
    }

    Ok(AggregatedTable {
        population_headers,
        rows,
    })
}
