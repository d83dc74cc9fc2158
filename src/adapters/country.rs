use crate::adapters::retriever::Retriever;
use crate::domain::ports::CountryLookup;
use crate::utils::error::Result;
use serde::Deserialize;
use std::collections::HashMap;

/// One country's classification flags from the country attributes feed.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryAttributes {
    pub iso3: String,
    pub has_hrp: bool,
    pub in_gho: bool,
}

/// Country classification backed by a JSON attributes file fetched once at
/// startup. Unknown ISO3 codes resolve to `None` on both flags.
pub struct HdxCountryLookup {
    countries: HashMap<String, CountryAttributes>,
}

impl HdxCountryLookup {
    pub async fn load(retriever: &Retriever, url: &str) -> Result<Self> {
        let countries: Vec<CountryAttributes> =
            retriever.fetch_json(url, "countries.json").await?;
        tracing::debug!("Loaded classification flags for {} countries", countries.len());
        Ok(Self::from_countries(countries))
    }

    pub fn from_countries(countries: Vec<CountryAttributes>) -> Self {
        Self {
            countries: countries
                .into_iter()
                .map(|c| (c.iso3.clone(), c))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl CountryLookup for HdxCountryLookup {
    fn hrp_status(&self, iso3: &str) -> Option<bool> {
        self.countries.get(iso3).map(|c| c.has_hrp)
    }

    fn gho_status(&self, iso3: &str) -> Option<bool> {
        self.countries.get(iso3).map(|c| c.in_gho)
    }
}
