// Data structures for dataset snapshots and per-entity series

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Metric carried by a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    #[default]
    Confirmed,
    Dead,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Confirmed => "confirmed",
            MetricKind::Dead => "dead",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            MetricKind::Confirmed => MetricKind::Dead,
            MetricKind::Dead => MetricKind::Confirmed,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per date of the dataset; `None` marks a missing entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySeries {
    pub values: Vec<Option<f64>>,
}

impl EntitySeries {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}

/// The confirmed/dead pair shown for one country or region.
#[derive(Debug, Clone, PartialEq)]
pub struct RowData {
    pub confirmed: Arc<EntitySeries>,
    pub dead: Arc<EntitySeries>,
}

impl RowData {
    pub fn series(&self, kind: MetricKind) -> &EntitySeries {
        match kind {
            MetricKind::Confirmed => &self.confirmed,
            MetricKind::Dead => &self.dead,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub confirmed: EntitySeries,
    pub dead: EntitySeries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountrySnapshot {
    #[serde(default)]
    pub population: Option<u64>,
    pub confirmed: EntitySeries,
    pub dead: EntitySeries,
    #[serde(default)]
    pub regions: BTreeMap<String, RegionSnapshot>,
}

/// On-disk shape of a dataset, as produced by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub dates: Vec<String>,
    pub countries: BTreeMap<String, CountrySnapshot>,
}

/// World totals for a single date.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WorldTotals {
    pub total_cases: f64,
    pub total_deaths: f64,
}
