use std::collections::BTreeMap;
use std::fmt;

/// The two output categories a population group code can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Refugees,
    Returnees,
}

impl DataType {
    pub const ALL: [DataType; 2] = [DataType::Refugees, DataType::Returnees];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Refugees => "refugees",
            DataType::Returnees => "returnees",
        }
    }

    /// Refugee output is split into year windows; returnee output is a single resource.
    pub fn is_partitioned(&self) -> bool {
        matches!(self, DataType::Refugees)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
    All,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "f",
            Gender::Male => "m",
            Gender::All => "all",
        }
    }
}

/// The source table as parsed from the downloaded CSV: one header row plus
/// data rows (the sub-header row is already skipped at extract time).
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Identifiers of the source dataset/resource, stamped on every output record.
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    pub dataset_id: String,
    pub dataset_name: String,
    pub resource_id: String,
}

#[derive(Debug, Clone)]
pub struct ExtractResult {
    pub table: RawTable,
    pub source: SourceInfo,
}

/// One row per unique (year, origin, asylum, population group) key, with the
/// population counts summed across duplicate source rows. `populations` is
/// aligned with the owning table's `population_headers`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub year: i32,
    pub origin_code: String,
    pub asylum_code: String,
    pub population_group: String,
    pub populations: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTable {
    pub population_headers: Vec<String>,
    pub rows: Vec<AggregatedRow>,
}

/// One output line: an aggregated row crossed with one population column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub origin_location_code: String,
    pub origin_has_hrp: Option<bool>,
    pub origin_in_gho: Option<bool>,
    pub asylum_location_code: String,
    pub asylum_has_hrp: Option<bool>,
    pub asylum_in_gho: Option<bool>,
    pub population_group: String,
    pub gender: Gender,
    pub age_range: String,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub population: i64,
    pub reference_period_start: String,
    pub reference_period_end: String,
    pub dataset_hdx_id: String,
    pub resource_hdx_id: String,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub year: i32,
}

impl OutputRecord {
    pub const KNOWN_HEADERS: [&'static str; 19] = [
        "origin_location_code",
        "origin_has_hrp",
        "origin_in_gho",
        "asylum_location_code",
        "asylum_has_hrp",
        "asylum_in_gho",
        "population_group",
        "gender",
        "age_range",
        "min_age",
        "max_age",
        "population",
        "reference_period_start",
        "reference_period_end",
        "dataset_hdx_id",
        "resource_hdx_id",
        "warning",
        "error",
        "year",
    ];

    /// Renders one field by output header name. Column order is decided by
    /// configuration, so the writer pulls fields by name rather than position.
    pub fn field(&self, header: &str) -> Option<String> {
        fn yn(flag: Option<bool>) -> String {
            match flag {
                Some(true) => "Y".to_string(),
                Some(false) => "N".to_string(),
                None => String::new(),
            }
        }
        fn opt_num(value: Option<u32>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        let value = match header {
            "origin_location_code" => self.origin_location_code.clone(),
            "origin_has_hrp" => yn(self.origin_has_hrp),
            "origin_in_gho" => yn(self.origin_in_gho),
            "asylum_location_code" => self.asylum_location_code.clone(),
            "asylum_has_hrp" => yn(self.asylum_has_hrp),
            "asylum_in_gho" => yn(self.asylum_in_gho),
            "population_group" => self.population_group.clone(),
            "gender" => self.gender.as_str().to_string(),
            "age_range" => self.age_range.clone(),
            "min_age" => opt_num(self.min_age),
            "max_age" => opt_num(self.max_age),
            "population" => self.population.to_string(),
            "reference_period_start" => self.reference_period_start.clone(),
            "reference_period_end" => self.reference_period_end.clone(),
            "dataset_hdx_id" => self.dataset_hdx_id.clone(),
            "resource_hdx_id" => self.resource_hdx_id.clone(),
            "warning" => self.warning.clone().unwrap_or_default(),
            "error" => self.error.clone().unwrap_or_default(),
            "year" => self.year.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Transform output: classified records and observed years, keyed by data type.
/// Only data types that received at least one row have an entry.
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub data: BTreeMap<DataType, Vec<OutputRecord>>,
    pub years: BTreeMap<DataType, Vec<i32>>,
    pub source: SourceInfo,
}
