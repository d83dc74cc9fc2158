use crate::domain::model::{
    AggregatedTable, DataType, Gender, OutputRecord, SourceInfo, TransformResult,
};
use crate::domain::ports::{CountryLookup, ErrorSink};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use std::collections::HashMap;

pub const REFUGEE_POPULATION_GROUPS: [&str; 10] = [
    "REF", "ROC", "ASY", "OIP", "IOC", "STA", "OOC", "HST", "RST", "NAT",
];

pub const RETURNEE_POPULATION_GROUPS: [&str; 3] = ["RET", "RDP", "RRI"];

pub fn classify_population_group(code: &str) -> Option<DataType> {
    if REFUGEE_POPULATION_GROUPS.contains(&code) {
        return Some(DataType::Refugees);
    }
    if RETURNEE_POPULATION_GROUPS.contains(&code) {
        return Some(DataType::Returnees);
    }
    None
}

/// Splits a population column header into gender and age-range label.
/// "Female 0-5" -> (f, "0-5"), "Male 80 or more" -> (m, "80+"), "Total" -> (all, "all").
pub fn gender_and_age_range(header: &str) -> (Gender, String) {
    let header = header.to_lowercase();

    let gender = if header.starts_with("female") {
        Gender::Female
    } else if header.starts_with("male") {
        Gender::Male
    } else {
        Gender::All
    };

    let age_component = match header.split_once(' ') {
        None => return (gender, "all".to_string()),
        Some((_, rest)) => rest.trim(),
    };
    if age_component == "total" {
        return (gender, "all".to_string());
    }

    let age_range = match age_component.strip_suffix(" or more") {
        Some(base) => format!("{}+", base),
        None => age_component.to_string(),
    };
    (gender, age_range)
}

/// Numeric bounds for an age-range label: "A-B" -> (A, B), "N+" -> (N, None),
/// "all"/"unknown" or anything non-numeric -> (None, None).
pub fn min_and_max_age(age_range: &str) -> (Option<u32>, Option<u32>) {
    if age_range == "all" || age_range == "unknown" {
        return (None, None);
    }
    let ages: Vec<&str> = age_range.split('-').collect();
    if ages.len() == 2 {
        match (ages[0].trim().parse(), ages[1].trim().parse()) {
            (Ok(min), Ok(max)) => (Some(min), Some(max)),
            _ => (None, None),
        }
    } else {
        match age_range.trim_end_matches('+').trim().parse() {
            Ok(min) => (Some(min), None),
            Err(_) => (None, None),
        }
    }
}

/// Reference period covering the full calendar year, as ISO-8601 strings.
pub fn reference_period(year: i32) -> Result<(String, String)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EtlError::ProcessingError {
            message: format!("Year {} is out of range", year),
        })?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .ok_or_else(|| EtlError::ProcessingError {
            message: format!("Year {} is out of range", year),
        })?;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
    Ok((
        start.format(FORMAT).to_string(),
        end.format(FORMAT).to_string(),
    ))
}

/// Turns aggregated rows into output records: resolves HRP/GHO flags per
/// country (memoized for the run), classifies the population group, and emits
/// one record per recognized population column.
pub struct Classifier<'a, L: CountryLookup, E: ErrorSink> {
    component: &'a str,
    dataset_name: &'a str,
    lookup: &'a L,
    errors: &'a E,
    hrps: HashMap<String, Option<bool>>,
    ghos: HashMap<String, Option<bool>>,
}

impl<'a, L: CountryLookup, E: ErrorSink> Classifier<'a, L, E> {
    pub fn new(component: &'a str, dataset_name: &'a str, lookup: &'a L, errors: &'a E) -> Self {
        Self {
            component,
            dataset_name,
            lookup,
            errors,
            hrps: HashMap::new(),
            ghos: HashMap::new(),
        }
    }

    /// Flags are cached per ISO3 code for the lifetime of the run. A code with
    /// no HRP classification is recorded as missing on every row that uses it,
    /// so each affected row carries the error.
    fn resolve_flags(&mut self, iso3: &str, missing: &mut Vec<String>) -> (Option<bool>, Option<bool>) {
        let hrp = match self.hrps.get(iso3) {
            Some(&cached) => cached,
            None => {
                let status = self.lookup.hrp_status(iso3);
                self.hrps.insert(iso3.to_string(), status);
                status
            }
        };
        if hrp.is_none() {
            missing.push(iso3.to_string());
        }

        let gho = match self.ghos.get(iso3) {
            Some(&cached) => cached,
            None => {
                let status = self.lookup.gho_status(iso3);
                self.ghos.insert(iso3.to_string(), status);
                status
            }
        };

        (hrp, gho)
    }

    pub fn classify(
        &mut self,
        aggregated: &AggregatedTable,
        source: &SourceInfo,
    ) -> Result<TransformResult> {
        let mut result = TransformResult {
            source: source.clone(),
            ..Default::default()
        };

        for row in &aggregated.rows {
            let mut missing_locations = Vec::new();
            let (origin_hrp, origin_gho) = self.resolve_flags(&row.origin_code, &mut missing_locations);
            let (asylum_hrp, asylum_gho) = self.resolve_flags(&row.asylum_code, &mut missing_locations);

            let error = if missing_locations.is_empty() {
                None
            } else {
                for code in &missing_locations {
                    self.errors.add_message(
                        self.component,
                        self.dataset_name,
                        &format!("Could not find iso code {}", code),
                    );
                }
                // distinct codes, first-occurrence order, to keep output stable
                let mut distinct: Vec<&str> = Vec::new();
                for code in &missing_locations {
                    if !distinct.contains(&code.as_str()) {
                        distinct.push(code.as_str());
                    }
                }
                Some(format!("Non matching country code(s) {}", distinct.join(",")))
            };

            let (start_date, end_date) = reference_period(row.year)?;

            let data_type = match classify_population_group(&row.population_group) {
                Some(data_type) => data_type,
                None => {
                    self.errors.add_missing_value(
                        self.component,
                        self.dataset_name,
                        "Population group",
                        &row.population_group,
                    );
                    continue;
                }
            };

            result.years.entry(data_type).or_default().push(row.year);
            let records = result.data.entry(data_type).or_default();

            for (header, &population) in
                aggregated.population_headers.iter().zip(&row.populations)
            {
                if header.to_lowercase().contains("unknown") {
                    continue;
                }
                let (gender, age_range) = gender_and_age_range(header);
                let (min_age, max_age) = min_and_max_age(&age_range);

                records.push(OutputRecord {
                    origin_location_code: row.origin_code.clone(),
                    origin_has_hrp: origin_hrp,
                    origin_in_gho: origin_gho,
                    asylum_location_code: row.asylum_code.clone(),
                    asylum_has_hrp: asylum_hrp,
                    asylum_in_gho: asylum_gho,
                    population_group: row.population_group.clone(),
                    gender,
                    age_range,
                    min_age,
                    max_age,
                    population,
                    reference_period_start: start_date.clone(),
                    reference_period_end: end_date.clone(),
                    dataset_hdx_id: source.dataset_id.clone(),
                    resource_hdx_id: source.resource_id.clone(),
                    warning: None,
                    error: error.clone(),
                    year: row.year,
                });
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AggregatedRow;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapLookup {
        countries: HashMap<&'static str, (bool, bool)>,
    }

    impl MapLookup {
        fn new() -> Self {
            let mut countries = HashMap::new();
            countries.insert("AFG", (true, true));
            countries.insert("PAK", (false, false));
            countries.insert("SYR", (true, true));
            Self { countries }
        }
    }

    impl CountryLookup for MapLookup {
        fn hrp_status(&self, iso3: &str) -> Option<bool> {
            self.countries.get(iso3).map(|&(hrp, _)| hrp)
        }

        fn gho_status(&self, iso3: &str) -> Option<bool> {
            self.countries.get(iso3).map(|&(_, gho)| gho)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
        missing_values: Mutex<Vec<(String, String)>>,
    }

    impl ErrorSink for RecordingSink {
        fn add_message(&self, _component: &str, _dataset: &str, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }

        fn add_missing_value(&self, _component: &str, _dataset: &str, category: &str, value: &str) {
            self.missing_values
                .lock()
                .unwrap()
                .push((category.to_string(), value.to_string()));
        }
    }

    fn aggregated(rows: Vec<AggregatedRow>, headers: Vec<&str>) -> AggregatedTable {
        AggregatedTable {
            population_headers: headers.into_iter().map(str::to_string).collect(),
            rows,
        }
    }

    fn row(year: i32, origin: &str, asylum: &str, group: &str, populations: Vec<i64>) -> AggregatedRow {
        AggregatedRow {
            year,
            origin_code: origin.to_string(),
            asylum_code: asylum.to_string(),
            population_group: group.to_string(),
            populations,
        }
    }

    fn source() -> SourceInfo {
        SourceInfo {
            dataset_id: "dataset-id".to_string(),
            dataset_name: "unhcr-population".to_string(),
            resource_id: "resource-id".to_string(),
        }
    }

    #[test]
    fn test_population_group_membership() {
        for code in REFUGEE_POPULATION_GROUPS {
            assert_eq!(classify_population_group(code), Some(DataType::Refugees));
        }
        for code in RETURNEE_POPULATION_GROUPS {
            assert_eq!(classify_population_group(code), Some(DataType::Returnees));
        }
        assert_eq!(classify_population_group("XYZ"), None);
        assert_eq!(classify_population_group("ref"), None);
    }

    #[test]
    fn test_gender_and_age_range() {
        assert_eq!(gender_and_age_range("Female 0-5"), (Gender::Female, "0-5".to_string()));
        assert_eq!(gender_and_age_range("Male 80 or more"), (Gender::Male, "80+".to_string()));
        assert_eq!(gender_and_age_range("Total"), (Gender::All, "all".to_string()));
        assert_eq!(gender_and_age_range("Female Total"), (Gender::Female, "all".to_string()));
        assert_eq!(gender_and_age_range("Total 12-17"), (Gender::All, "12-17".to_string()));
        assert_eq!(gender_and_age_range("female 18-59"), (Gender::Female, "18-59".to_string()));
    }

    #[test]
    fn test_min_and_max_age() {
        assert_eq!(min_and_max_age("0-5"), (Some(0), Some(5)));
        assert_eq!(min_and_max_age("18-59"), (Some(18), Some(59)));
        assert_eq!(min_and_max_age("80+"), (Some(80), None));
        assert_eq!(min_and_max_age("all"), (None, None));
        assert_eq!(min_and_max_age("unknown"), (None, None));
        assert_eq!(min_and_max_age("weird"), (None, None));
    }

    #[test]
    fn test_reference_period_spans_full_year() {
        let (start, end) = reference_period(2020).unwrap();
        assert_eq!(start, "2020-01-01T00:00:00");
        assert_eq!(end, "2020-12-31T23:59:59");
    }

    #[test]
    fn test_classify_emits_one_record_per_column_and_drops_unknown() {
        let lookup = MapLookup::new();
        let sink = RecordingSink::default();
        let mut classifier = Classifier::new("pipeline", "unhcr-population", &lookup, &sink);

        let table = aggregated(
            vec![row(2020, "AFG", "PAK", "REF", vec![3, 2, 10, 1])],
            vec!["Female 0-5", "Male 80 or more", "Total", "Total unknown"],
        );
        let result = classifier.classify(&table, &source()).unwrap();

        let records = &result.data[&DataType::Refugees];
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].gender, Gender::Female);
        assert_eq!(records[0].age_range, "0-5");
        assert_eq!(records[0].min_age, Some(0));
        assert_eq!(records[0].max_age, Some(5));
        assert_eq!(records[0].population, 3);

        assert_eq!(records[1].gender, Gender::Male);
        assert_eq!(records[1].age_range, "80+");
        assert_eq!(records[1].min_age, Some(80));
        assert_eq!(records[1].max_age, None);
        assert_eq!(records[1].population, 2);

        assert_eq!(records[2].gender, Gender::All);
        assert_eq!(records[2].age_range, "all");
        assert_eq!(records[2].min_age, None);
        assert_eq!(records[2].max_age, None);
        assert_eq!(records[2].population, 10);

        assert_eq!(records[0].origin_has_hrp, Some(true));
        assert_eq!(records[0].asylum_has_hrp, Some(false));
        assert_eq!(records[0].reference_period_start, "2020-01-01T00:00:00");
        assert_eq!(records[0].reference_period_end, "2020-12-31T23:59:59");
        assert_eq!(records[0].dataset_hdx_id, "dataset-id");
        assert!(records[0].error.is_none());
        assert_eq!(result.years[&DataType::Refugees], vec![2020]);
    }

    #[test]
    fn test_unclassified_group_skips_row_with_warning() {
        let lookup = MapLookup::new();
        let sink = RecordingSink::default();
        let mut classifier = Classifier::new("pipeline", "unhcr-population", &lookup, &sink);

        let table = aggregated(
            vec![
                row(2020, "AFG", "PAK", "XYZ", vec![5]),
                row(2020, "AFG", "PAK", "RET", vec![5]),
            ],
            vec!["Total"],
        );
        let result = classifier.classify(&table, &source()).unwrap();

        assert!(!result.data.contains_key(&DataType::Refugees));
        assert_eq!(result.data[&DataType::Returnees].len(), 1);

        let missing = sink.missing_values.lock().unwrap();
        assert_eq!(
            *missing,
            vec![("Population group".to_string(), "XYZ".to_string())]
        );
    }

    #[test]
    fn test_unresolvable_country_still_emits_with_error() {
        let lookup = MapLookup::new();
        let sink = RecordingSink::default();
        let mut classifier = Classifier::new("pipeline", "unhcr-population", &lookup, &sink);

        let table = aggregated(vec![row(2021, "ZZZ", "PAK", "REF", vec![7])], vec!["Total"]);
        let result = classifier.classify(&table, &source()).unwrap();

        let records = &result.data[&DataType::Refugees];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].origin_has_hrp, None);
        assert_eq!(records[0].origin_in_gho, None);
        assert_eq!(
            records[0].error.as_deref(),
            Some("Non matching country code(s) ZZZ")
        );

        let messages = sink.messages.lock().unwrap();
        assert_eq!(*messages, vec!["Could not find iso code ZZZ".to_string()]);
    }

    #[test]
    fn test_missing_code_listed_once_per_row_even_when_repeated() {
        let lookup = MapLookup::new();
        let sink = RecordingSink::default();
        let mut classifier = Classifier::new("pipeline", "unhcr-population", &lookup, &sink);

        let table = aggregated(vec![row(2021, "ZZZ", "ZZZ", "REF", vec![1])], vec!["Total"]);
        let result = classifier.classify(&table, &source()).unwrap();

        let records = &result.data[&DataType::Refugees];
        assert_eq!(
            records[0].error.as_deref(),
            Some("Non matching country code(s) ZZZ")
        );
    }
}
