//! Weather provider
//!
//! Supplies the fixed-length multi-day forecast shown on the dashboard
//! and report screens. The current implementation synthesizes a
//! deterministic forecast from today's date; a real forecast source can
//! replace it without changing the contract: given a location string,
//! asynchronously yield exactly [`FORECAST_DAYS`] day-forecasts, or an
//! error the caller degrades to an empty list.

use chrono::{Days, Local, NaiveDate};
use shared::DayForecast;

use crate::error::AppResult;

/// Number of days in every forecast
pub const FORECAST_DAYS: usize = 6;

/// Weather client
#[derive(Debug, Clone, Default)]
pub struct WeatherClient;

impl WeatherClient {
    pub fn new() -> Self {
        Self
    }

    /// Fetch the multi-day forecast for a farm location.
    pub async fn get_forecast(&self, location: &str) -> AppResult<Vec<DayForecast>> {
        tracing::debug!(location, "fetching simulated weather forecast");
        Ok(synthesize_forecast(Local::now().date_naive()))
    }
}

/// Build the simulated forecast starting at `start`.
///
/// Conditions follow a repeating pattern (days 0 and 3 sunny, 1 and 4
/// showers, 5 cloudy, otherwise partly cloudy) and temperatures rise by
/// one degree per day offset.
fn synthesize_forecast(start: NaiveDate) -> Vec<DayForecast> {
    (0..FORECAST_DAYS)
        .map(|i| {
            let date = start
                .checked_add_days(Days::new(i as u64))
                .unwrap_or(start);
            let (condition, icon) = match i {
                0 | 3 => ("Sunny", "01d"),
                1 | 4 => ("Showers", "09d"),
                5 => ("Cloudy", "03d"),
                _ => ("Partly Cloudy", "02d"),
            };
            DayForecast {
                date: date.format("%a, %b %-d").to_string(),
                condition: condition.to_string(),
                temp_min: 20.0 + i as f64,
                temp_max: 28.0 + i as f64,
                icon: icon.to_string(),
            }
        })
        .collect()
}
