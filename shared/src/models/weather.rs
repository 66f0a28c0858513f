//! Weather forecast model

use serde::{Deserialize, Serialize};

/// A single day's outlook in the multi-day forecast strip.
///
/// Transient display data: produced per dashboard or report visit, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayForecast {
    /// Display label, e.g. "Mon, Aug 30".
    pub date: String,
    pub condition: String,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Icon code in the OpenWeatherMap style, e.g. "01d".
    pub icon: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_wire_field_names() {
        let day = DayForecast {
            date: "Mon, Aug 30".to_string(),
            condition: "Sunny".to_string(),
            temp_min: 20.0,
            temp_max: 28.0,
            icon: "01d".to_string(),
        };
        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["tempMin"], 20.0);
        assert_eq!(json["tempMax"], 28.0);
    }
}
