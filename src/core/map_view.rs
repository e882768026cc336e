// Values shown by the map page for the slider position

use crate::core::format::MetricKind;
use crate::core::metrics::mortality_rate;
use crate::core::playback::PlaybackState;
use crate::core::store::Dataset;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrame {
    pub date: Option<NaiveDate>,
    pub data_type: MetricKind,
    pub playback: PlaybackState,
    pub headline: Option<f64>,
    pub world_confirmed: Option<f64>,
    pub world_deaths: Option<f64>,
    pub world_mortality_rate: Option<f64>,
}

pub fn map_frame(dataset: Option<&Dataset>, playback: PlaybackState, data_type: MetricKind) -> MapFrame {
    let index = playback.current_index;
    let date = dataset.and_then(|dataset| dataset.dates().get(index).copied());
    let totals = dataset.and_then(|dataset| dataset.world_totals_at(index));

    let world_confirmed = totals.map(|t| t.total_cases);
    let world_deaths = totals.map(|t| t.total_deaths);
    let world_mortality_rate = match (world_confirmed, world_deaths) {
        (Some(cases), Some(deaths)) if deaths > 0.0 => mortality_rate(cases, deaths),
        _ => None,
    };

    MapFrame {
        date,
        data_type,
        playback,
        headline: match data_type {
            MetricKind::Confirmed => world_confirmed,
            MetricKind::Dead => world_deaths,
        },
        world_confirmed,
        world_deaths,
        world_mortality_rate,
    }
}
