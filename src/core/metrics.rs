// Pure functions deriving display values from raw counts

use crate::core::constants::PLACEHOLDER;
use crate::core::format::EntitySeries;

/// Deaths over confirmed cases. `None` when there are no confirmed cases.
pub fn mortality_rate(confirmed: f64, deaths: f64) -> Option<f64> {
    if confirmed > 0.0 {
        Some(deaths / confirmed)
    } else {
        None
    }
}

pub fn per_capita_label(scale: u64) -> String {
    format!("per {} inhabitants", number_with_commas(scale))
}

/// Last entry of the series that is not missing.
pub fn latest_non_empty_value(series: &EntitySeries) -> Option<f64> {
    series.values.iter().rev().find_map(|v| *v)
}

/// Scales a raw count to "per `scale` inhabitants".
pub fn per_capita_value(value: f64, population: Option<u64>, scale: u64) -> Option<f64> {
    match population {
        Some(population) if population > 0 => Some(value / population as f64 * scale as f64),
        _ => None,
    }
}

pub fn number_with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Percentage with two decimals, or the placeholder for an undefined rate.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) if rate.is_finite() => format!("{:.2}%", rate * 100.0),
        _ => PLACEHOLDER.to_string(),
    }
}
