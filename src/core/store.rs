// Dataset loading and the shared, observable data store

use crate::core::compression::{decompress, CompressionType};
use crate::core::error::{DashboardError, Result};
use crate::core::format::*;
use crate::core::metrics::latest_non_empty_value;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
struct CountryEntry {
    population: Option<u64>,
    row: RowData,
    regions: Vec<String>,
}

#[derive(Debug)]
struct RegionEntry {
    country: String,
    row: RowData,
}

/// A fully loaded, validated dataset. Read-only once built.
#[derive(Debug)]
pub struct Dataset {
    dates: Vec<NaiveDate>,
    countries: BTreeMap<String, CountryEntry>,
    regions: HashMap<String, RegionEntry>,
    world_totals: Vec<WorldTotals>,
    countries_by_cases: Vec<String>,
}

impl Dataset {
    pub fn from_snapshot(snapshot: DatasetSnapshot) -> Result<Self> {
        let dates = Self::parse_dates(&snapshot.dates)?;
        let len = dates.len();

        let mut countries = BTreeMap::new();
        let mut regions = HashMap::new();
        let mut world_totals = vec![WorldTotals::default(); len];

        for (name, country) in snapshot.countries {
            Self::check_len(&name, "confirmed", &country.confirmed, len)?;
            Self::check_len(&name, "dead", &country.dead, len)?;

            for (i, totals) in world_totals.iter_mut().enumerate() {
                totals.total_cases += country.confirmed.get(i).unwrap_or(0.0);
                totals.total_deaths += country.dead.get(i).unwrap_or(0.0);
            }

            let mut region_names = Vec::with_capacity(country.regions.len());
            for (region_name, region) in country.regions {
                Self::check_len(&region_name, "confirmed", &region.confirmed, len)?;
                Self::check_len(&region_name, "dead", &region.dead, len)?;

                region_names.push(region_name.clone());
                regions.insert(
                    region_name,
                    RegionEntry {
                        country: name.clone(),
                        row: RowData {
                            confirmed: Arc::new(region.confirmed),
                            dead: Arc::new(region.dead),
                        },
                    },
                );
            }

            countries.insert(
                name,
                CountryEntry {
                    population: country.population,
                    row: RowData {
                        confirmed: Arc::new(country.confirmed),
                        dead: Arc::new(country.dead),
                    },
                    regions: region_names,
                },
            );
        }

        let mut by_cases: Vec<(String, f64)> = countries
            .iter()
            .map(|(name, entry)| {
                let latest = latest_non_empty_value(&entry.row.confirmed).unwrap_or(0.0);
                (name.clone(), latest)
            })
            .collect();
        by_cases.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(Self {
            dates,
            countries,
            regions,
            world_totals,
            countries_by_cases: by_cases.into_iter().map(|(name, _)| name).collect(),
        })
    }

    fn parse_dates(raw: &[String]) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::with_capacity(raw.len());
        for (i, value) in raw.iter().enumerate() {
            let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
                DashboardError::InvalidDate {
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            if let Some(prev) = dates.last() {
                if date <= *prev {
                    return Err(DashboardError::UnorderedDates(i));
                }
            }
            dates.push(date);
        }
        Ok(dates)
    }

    fn check_len(entity: &str, kind: &'static str, series: &EntitySeries, expected: usize) -> Result<()> {
        if series.len() != expected {
            return Err(DashboardError::SeriesLengthMismatch {
                entity: entity.to_string(),
                kind,
                expected,
                got: series.len(),
            });
        }
        Ok(())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn country_data(&self, country: &str) -> Option<RowData> {
        self.countries.get(country).map(|entry| entry.row.clone())
    }

    pub fn region_data(&self, region: &str) -> Option<RowData> {
        self.regions.get(region).map(|entry| entry.row.clone())
    }

    pub fn region_country(&self, region: &str) -> Option<&str> {
        self.regions.get(region).map(|entry| entry.country.as_str())
    }

    pub fn population(&self, country: &str) -> Option<u64> {
        self.countries.get(country).and_then(|entry| entry.population)
    }

    pub fn is_country(&self, country: &str) -> bool {
        self.countries.contains_key(country)
    }

    /// Alphabetical.
    pub fn possible_countries(&self) -> Vec<&str> {
        self.countries.keys().map(String::as_str).collect()
    }

    pub fn possible_countries_sorted_by_cases(&self) -> &[String] {
        &self.countries_by_cases
    }

    pub fn possible_regions_by_country(&self, country: &str) -> &[String] {
        self.countries
            .get(country)
            .map(|entry| entry.regions.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_region_of(&self, country: &str, region: &str) -> bool {
        self.region_country(region) == Some(country)
    }

    pub fn last_region_cases(&self, region: &str) -> Option<f64> {
        self.regions
            .get(region)
            .and_then(|entry| latest_non_empty_value(&entry.row.confirmed))
    }

    pub fn last_region_deaths(&self, region: &str) -> Option<f64> {
        self.regions
            .get(region)
            .and_then(|entry| latest_non_empty_value(&entry.row.dead))
    }

    pub fn world_totals_at(&self, index: usize) -> Option<WorldTotals> {
        self.world_totals.get(index).copied()
    }
}

/// Shared handle to the dataset. Empty until a load completes; observers
/// are notified through a watch channel on every install.
#[derive(Debug)]
pub struct DataStore {
    dataset: watch::Sender<Option<Arc<Dataset>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (dataset, _) = watch::channel(None);
        Self { dataset }
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        let store = Self::new();
        store.install(dataset);
        store
    }

    pub fn ready(&self) -> bool {
        self.dataset.borrow().is_some()
    }

    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.borrow().clone()
    }

    pub fn install(&self, dataset: Dataset) {
        info!(
            "Dataset installed: {} dates, {} countries",
            dataset.dates.len(),
            dataset.countries.len()
        );
        self.dataset.send_replace(Some(Arc::new(dataset)));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Dataset>>> {
        self.dataset.subscribe()
    }

    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await?;
        let data = decompress(&raw, CompressionType::from_path(path))?;
        let snapshot: DatasetSnapshot = serde_json::from_slice(&data)?;
        self.install(Dataset::from_snapshot(snapshot)?);
        Ok(())
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn series(values: &[Option<f64>]) -> EntitySeries {
        EntitySeries::new(values.to_vec())
    }

    /// Three dates, US with California and Texas, plus Italy.
    pub(crate) fn sample_snapshot() -> DatasetSnapshot {
        let mut us_regions = BTreeMap::new();
        us_regions.insert(
            "California".to_string(),
            RegionSnapshot {
                confirmed: series(&[Some(10.0), Some(120.0), Some(300.0)]),
                dead: series(&[Some(0.0), Some(2.0), Some(6.0)]),
            },
        );
        us_regions.insert(
            "Texas".to_string(),
            RegionSnapshot {
                confirmed: series(&[Some(5.0), Some(40.0), None]),
                dead: series(&[Some(0.0), Some(1.0), None]),
            },
        );

        let mut countries = BTreeMap::new();
        countries.insert(
            "US".to_string(),
            CountrySnapshot {
                population: Some(300_000_000),
                confirmed: series(&[Some(50.0), Some(400.0), Some(1000.0)]),
                dead: series(&[Some(1.0), Some(10.0), Some(50.0)]),
                regions: us_regions,
            },
        );
        countries.insert(
            "Italy".to_string(),
            CountrySnapshot {
                population: Some(60_000_000),
                confirmed: series(&[Some(150.0), Some(900.0), Some(2000.0)]),
                dead: series(&[Some(3.0), Some(40.0), Some(200.0)]),
                regions: BTreeMap::new(),
            },
        );

        DatasetSnapshot {
            dates: vec![
                "2020-03-01".to_string(),
                "2020-03-02".to_string(),
                "2020-03-03".to_string(),
            ],
            countries,
        }
    }

    pub(crate) fn sample_store() -> Arc<DataStore> {
        Arc::new(DataStore::with_dataset(
            Dataset::from_snapshot(sample_snapshot()).unwrap(),
        ))
    }

    #[test]
    fn test_dataset_queries() {
        let dataset = Dataset::from_snapshot(sample_snapshot()).unwrap();

        assert_eq!(dataset.dates().len(), 3);
        assert_eq!(dataset.possible_countries(), vec!["Italy", "US"]);
        assert_eq!(dataset.possible_countries_sorted_by_cases(), &["Italy", "US"]);
        assert_eq!(dataset.possible_regions_by_country("US"), &["California", "Texas"]);
        assert!(dataset.possible_regions_by_country("Italy").is_empty());
        assert!(dataset.is_region_of("US", "Texas"));
        assert!(!dataset.is_region_of("Italy", "Texas"));
        assert_eq!(dataset.last_region_cases("Texas"), Some(40.0));
        assert_eq!(dataset.last_region_deaths("California"), Some(6.0));
        assert_eq!(dataset.population("Italy"), Some(60_000_000));
    }

    #[test]
    fn test_world_totals() {
        let dataset = Dataset::from_snapshot(sample_snapshot()).unwrap();
        let totals = dataset.world_totals_at(2).unwrap();
        assert_eq!(totals.total_cases, 3000.0);
        assert_eq!(totals.total_deaths, 250.0);
        assert!(dataset.world_totals_at(3).is_none());
    }

    #[test]
    fn test_rejects_unordered_dates() {
        let mut snapshot = sample_snapshot();
        snapshot.dates.swap(0, 1);
        let err = Dataset::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, DashboardError::UnorderedDates(1)));
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let mut snapshot = sample_snapshot();
        snapshot.dates[1] = snapshot.dates[0].clone();
        assert!(Dataset::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_rejects_short_series() {
        let mut snapshot = sample_snapshot();
        snapshot.countries.get_mut("Italy").unwrap().dead.values.pop();
        let err = Dataset::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, DashboardError::SeriesLengthMismatch { expected: 3, got: 2, .. }));
    }

    #[test]
    fn test_store_readiness() {
        let store = DataStore::new();
        assert!(!store.ready());
        assert!(store.dataset().is_none());

        let mut rx = store.subscribe();
        store.install(Dataset::from_snapshot(sample_snapshot()).unwrap());
        assert!(store.ready());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().dates().len(), 3);
    }

    #[tokio::test]
    async fn test_load_file() {
        let path = std::env::temp_dir().join(format!("dataset-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, serde_json::to_vec(&sample_snapshot()).unwrap())
            .await
            .unwrap();

        let store = DataStore::new();
        store.load_file(&path).await.unwrap();
        assert!(store.ready());

        let _ = tokio::fs::remove_file(&path).await;
    }
}
