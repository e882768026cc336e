// Infection trajectories aligned on the day a country passed 100 cases

use crate::core::constants::TRAJECTORY_CASE_THRESHOLD;
use crate::core::format::MetricKind;
use crate::core::metrics::per_capita_value;
use crate::core::store::Dataset;
use serde::Serialize;
use std::collections::BTreeMap;

/// One x-axis position: days since the 100th case, with a value per country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub time: usize,
    pub values: BTreeMap<String, f64>,
}

pub fn trajectories(
    dataset: &Dataset,
    kind: MetricKind,
    countries: &[String],
    per_capita: bool,
    capita_scale: u64,
) -> Vec<TrajectoryPoint> {
    let mut rows: Vec<TrajectoryPoint> = Vec::new();

    for country in countries {
        let Some(row) = dataset.country_data(country) else {
            continue;
        };
        let Some(start) = row
            .confirmed
            .values
            .iter()
            .position(|v| v.map_or(false, |v| v >= TRAJECTORY_CASE_THRESHOLD))
        else {
            continue;
        };

        let population = dataset.population(country);
        for (time, value) in row.series(kind).values[start..].iter().enumerate() {
            let Some(value) = *value else {
                continue;
            };
            let value = if per_capita {
                match per_capita_value(value, population, capita_scale) {
                    Some(scaled) => scaled,
                    None => continue,
                }
            } else {
                value
            };

            while rows.len() <= time {
                rows.push(TrajectoryPoint {
                    time: rows.len(),
                    values: BTreeMap::new(),
                });
            }
            rows[time].values.insert(country.clone(), value);
        }
    }

    rows
}

/// Last `time` at which `country` has a value; where the chart puts its label.
pub fn last_point_time(rows: &[TrajectoryPoint], country: &str) -> Option<usize> {
    rows.iter()
        .rev()
        .find(|row| row.values.contains_key(country))
        .map(|row| row.time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::tests::sample_snapshot;

    fn dataset() -> Dataset {
        Dataset::from_snapshot(sample_snapshot()).unwrap()
    }

    #[test]
    fn test_alignment_on_hundredth_case() {
        let countries = vec!["US".to_string(), "Italy".to_string()];
        let rows = trajectories(&dataset(), MetricKind::Confirmed, &countries, false, 1_000_000);

        // Italy passes 100 on day 0 of the dataset, the US a day later
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].values["Italy"], 150.0);
        assert_eq!(rows[0].values["US"], 400.0);
        assert_eq!(rows[1].values["US"], 1000.0);
        assert!(!rows[2].values.contains_key("US"));
        assert_eq!(rows[2].values["Italy"], 2000.0);

        assert_eq!(last_point_time(&rows, "US"), Some(1));
        assert_eq!(last_point_time(&rows, "Italy"), Some(2));
        assert_eq!(last_point_time(&rows, "France"), None);
    }

    #[test]
    fn test_deaths_and_unknown_countries() {
        let countries = vec!["Atlantis".to_string(), "US".to_string()];
        let rows = trajectories(&dataset(), MetricKind::Dead, &countries, false, 1_000_000);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values["US"], 10.0);
        assert_eq!(rows[1].values["US"], 50.0);
    }

    #[test]
    fn test_per_capita_scaling() {
        let countries = vec!["Italy".to_string()];
        let rows = trajectories(&dataset(), MetricKind::Confirmed, &countries, true, 1_000_000);
        assert!((rows[0].values["Italy"] - 2.5).abs() < 1e-9);
    }
}
