// Country/region selection with query-string persistence

use crate::core::constants::*;
use crate::core::error::{DashboardError, Result};
use crate::core::format::RowData;
use crate::core::metrics::{latest_non_empty_value, mortality_rate, per_capita_label, per_capita_value};
use crate::core::store::{DataStore, Dataset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

/// What is being viewed. A per-capita selection never carries a region,
/// since regional population is not tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub country: String,
    pub region: String,
    pub per_capita: bool,
}

impl Selection {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: String::new(),
            per_capita: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        if self.per_capita && !self.region.is_empty() {
            self.region.clear();
        }
        self
    }

    /// The region if one is selected, else the country.
    pub fn showing_data_for(&self) -> &str {
        if self.region.is_empty() {
            &self.country
        } else {
            &self.region
        }
    }

    /// `country=..&region=..&per_capita=1`; empty region and `false` are omitted.
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair(QUERY_COUNTRY, &self.country);
        if !self.region.is_empty() {
            query.append_pair(QUERY_REGION, &self.region);
        }
        if self.per_capita {
            query.append_pair(QUERY_PER_CAPITA, "1");
        }
        query.finish()
    }

    /// Missing keys fall back to defaults; unknown keys are ignored.
    pub fn from_query(query: &str, default_country: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut selection = Selection::new(default_country);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                QUERY_COUNTRY if !value.is_empty() => selection.country = value.into_owned(),
                QUERY_REGION => selection.region = value.into_owned(),
                QUERY_PER_CAPITA => {
                    selection.per_capita = match value.as_ref() {
                        "1" | "true" => true,
                        "0" | "false" | "" => false,
                        other => {
                            return Err(DashboardError::InvalidQuery(format!(
                                "{} must be 0 or 1, got {:?}",
                                QUERY_PER_CAPITA, other
                            )))
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(selection.normalized())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedCounts {
    pub latest_confirmed: f64,
    pub latest_deaths: f64,
    pub mortality_rate: Option<f64>,
    pub confirmed_per_capita: Option<f64>,
    pub deaths_per_capita: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRow {
    pub region: String,
    pub cases: Option<f64>,
    pub deaths: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub ready: bool,
    pub selection: Selection,
    pub query: String,
    pub showing_data_for: String,
    pub counts: Option<DerivedCounts>,
    pub per_capita_label: Option<String>,
    pub show_region_picker: bool,
    pub regions: Vec<RegionRow>,
    pub show_us_maps: bool,
    pub countries: Vec<String>,
}

pub struct SelectionController {
    selection: Selection,
    store: Arc<DataStore>,
    default_country: String,
    capita_scale: u64,
}

impl SelectionController {
    pub fn new(store: Arc<DataStore>, default_country: &str, capita_scale: u64) -> Self {
        Self {
            selection: Selection::new(default_country),
            store,
            default_country: default_country.to_string(),
            capita_scale,
        }
    }

    /// Starts from a persisted selection, checked against the dataset if one
    /// is already loaded.
    pub fn restore(
        store: Arc<DataStore>,
        selection: Selection,
        default_country: &str,
        capita_scale: u64,
    ) -> Self {
        let mut controller = Self {
            selection: selection.normalized(),
            store,
            default_country: default_country.to_string(),
            capita_scale,
        };
        if let Some(dataset) = controller.store.dataset() {
            controller.reconcile(&dataset);
        }
        controller
    }

    /// An unknown country falls back to the default and a region that does
    /// not belong to the country is dropped. Returns whether anything changed.
    pub fn reconcile(&mut self, dataset: &Dataset) -> bool {
        let before = self.selection.clone();
        self.selection = self.selection.clone().normalized();

        if !dataset.is_country(&self.selection.country) {
            debug!("selected country {:?} unknown, using default", self.selection.country);
            self.selection.country = self.default_country.clone();
            self.selection.region.clear();
        }
        if !self.selection.region.is_empty()
            && !dataset.is_region_of(&self.selection.country, &self.selection.region)
        {
            debug!("selected region {:?} unknown, cleared", self.selection.region);
            self.selection.region.clear();
        }

        self.selection != before
    }

    pub fn selection(&self) -> Selection {
        self.selection.clone().normalized()
    }

    pub fn default_country(&self) -> &str {
        &self.default_country
    }

    /// Returns whether the selection changed. Unknown countries are ignored.
    pub fn select_country(&mut self, country: &str) -> bool {
        let known = self
            .store
            .dataset()
            .map(|dataset| dataset.is_country(country))
            .unwrap_or(false);
        if !known {
            debug!("select_country ignored: {:?}", country);
            return false;
        }

        self.selection.country = country.to_string();
        self.selection.region.clear();
        true
    }

    /// An empty region shows the country aggregate. Regions of other
    /// countries, and any region while per capita is on, are ignored.
    pub fn select_region(&mut self, region: &str) -> bool {
        if region.is_empty() {
            self.selection.region.clear();
            return true;
        }

        if self.selection.per_capita {
            debug!("select_region ignored while per capita: {:?}", region);
            return false;
        }

        let known = self
            .store
            .dataset()
            .map(|dataset| dataset.is_region_of(&self.selection.country, region))
            .unwrap_or(false);
        if !known {
            debug!("select_region ignored: {:?}", region);
            return false;
        }

        self.selection.region = region.to_string();
        true
    }

    pub fn set_per_capita(&mut self, per_capita: bool) {
        self.selection.per_capita = per_capita;
        if per_capita {
            self.selection.region.clear();
        }
    }

    /// Series of the selected region, or of the country when none is selected.
    pub fn current_row_data(&self) -> Option<RowData> {
        let dataset = self.store.dataset()?;
        let selection = self.selection();
        if selection.region.is_empty() {
            dataset.country_data(&selection.country)
        } else {
            dataset.region_data(&selection.region)
        }
    }

    pub fn derived_counts(&self) -> DerivedCounts {
        let Some(row) = self.current_row_data() else {
            return DerivedCounts::default();
        };

        let latest_confirmed = latest_non_empty_value(&row.confirmed).unwrap_or(0.0);
        let latest_deaths = latest_non_empty_value(&row.dead).unwrap_or(0.0);

        let selection = self.selection();
        let population = if selection.per_capita {
            self.store
                .dataset()
                .and_then(|dataset| dataset.population(&selection.country))
        } else {
            None
        };

        DerivedCounts {
            latest_confirmed,
            latest_deaths,
            mortality_rate: mortality_rate(latest_confirmed, latest_deaths),
            confirmed_per_capita: population
                .and_then(|p| per_capita_value(latest_confirmed, Some(p), self.capita_scale)),
            deaths_per_capita: population
                .and_then(|p| per_capita_value(latest_deaths, Some(p), self.capita_scale)),
        }
    }

    pub fn dashboard(&self) -> DashboardSummary {
        let selection = self.selection();
        let dataset = self.store.dataset();

        let regions_of_country: Vec<String> = dataset
            .as_ref()
            .map(|dataset| dataset.possible_regions_by_country(&selection.country).to_vec())
            .unwrap_or_default();
        let show_region_picker = !regions_of_country.is_empty() && !selection.per_capita;

        let regions = match (&dataset, show_region_picker) {
            (Some(dataset), true) => regions_of_country
                .iter()
                .map(|region| RegionRow {
                    region: region.clone(),
                    cases: dataset.last_region_cases(region),
                    deaths: dataset.last_region_deaths(region),
                })
                .collect(),
            _ => Vec::new(),
        };

        DashboardSummary {
            ready: dataset.is_some(),
            query: selection.to_query(),
            showing_data_for: selection.showing_data_for().to_string(),
            counts: self.current_row_data().map(|_| self.derived_counts()),
            per_capita_label: selection.per_capita.then(|| per_capita_label(self.capita_scale)),
            show_region_picker,
            regions,
            show_us_maps: selection.country == US_NAME && !selection.per_capita,
            countries: dataset
                .map(|dataset| dataset.possible_countries_sorted_by_cases().to_vec())
                .unwrap_or_default(),
            selection,
        }
    }
}
