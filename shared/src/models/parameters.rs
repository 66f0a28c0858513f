//! Water-quality parameter catalog, readings, and the status evaluator

use serde::{Deserialize, Serialize};

use crate::types::ParameterStatus;

/// The fixed set of parameters a lab report sheet can carry.
///
/// `ALL` is in display order (the order the edit and report screens list
/// them in), not alphabetical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    Ph,
    Salinity,
    DissolvedOxygen,
    Temperature,
    TotalAmmoniaNitrogen,
    UnionizedAmmonia,
    Nitrite,
    Hco3,
    Co2,
    TotalHardness,
    TotalCa,
    TotalMg,
    Iron,
    H2s,
    Chlorine,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 15] = [
        ParameterKey::Ph,
        ParameterKey::Salinity,
        ParameterKey::DissolvedOxygen,
        ParameterKey::Temperature,
        ParameterKey::TotalAmmoniaNitrogen,
        ParameterKey::UnionizedAmmonia,
        ParameterKey::Nitrite,
        ParameterKey::Hco3,
        ParameterKey::Co2,
        ParameterKey::TotalHardness,
        ParameterKey::TotalCa,
        ParameterKey::TotalMg,
        ParameterKey::Iron,
        ParameterKey::H2s,
        ParameterKey::Chlorine,
    ];

    /// Field name in the JSON wire/storage representation.
    pub fn json_key(self) -> &'static str {
        match self {
            ParameterKey::Ph => "pH",
            ParameterKey::Salinity => "salinity",
            ParameterKey::DissolvedOxygen => "dissolvedOxygen",
            ParameterKey::Temperature => "temperature",
            ParameterKey::TotalAmmoniaNitrogen => "totalAmmoniaNitrogen",
            ParameterKey::UnionizedAmmonia => "unionizedAmmonia",
            ParameterKey::Nitrite => "nitrite",
            ParameterKey::Hco3 => "hco3",
            ParameterKey::Co2 => "co2",
            ParameterKey::TotalHardness => "totalHardness",
            ParameterKey::TotalCa => "totalCa",
            ParameterKey::TotalMg => "totalMg",
            ParameterKey::Iron => "iron",
            ParameterKey::H2s => "h2s",
            ParameterKey::Chlorine => "chlorine",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParameterKey::Ph => "pH",
            ParameterKey::Salinity => "Salinity",
            ParameterKey::DissolvedOxygen => "Dissolved Oxygen",
            ParameterKey::Temperature => "Temperature",
            ParameterKey::TotalAmmoniaNitrogen => "Total Ammonia Nitrogen",
            ParameterKey::UnionizedAmmonia => "Unionized Ammonia",
            ParameterKey::Nitrite => "Nitrite",
            ParameterKey::Hco3 => "HCO3",
            ParameterKey::Co2 => "CO2",
            ParameterKey::TotalHardness => "Total Hardness",
            ParameterKey::TotalCa => "Total Ca",
            ParameterKey::TotalMg => "Total Mg",
            ParameterKey::Iron => "Iron",
            ParameterKey::H2s => "H2S",
            ParameterKey::Chlorine => "Chlorine",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ParameterKey::Ph => "",
            ParameterKey::Salinity => "ppt",
            ParameterKey::Temperature => "°C",
            _ => "ppm",
        }
    }

    /// Configured ideal range, if any.
    ///
    /// Only six parameters carry a range; the rest are recorded but not
    /// classified. Salinity and temperature are species-dependent and
    /// these bounds are deliberately broad.
    pub fn ideal_range(self) -> Option<IdealRange> {
        match self {
            ParameterKey::Ph => Some(IdealRange { min: 7.5, max: 8.5 }),
            ParameterKey::DissolvedOxygen => Some(IdealRange { min: 5.0, max: 10.0 }),
            ParameterKey::TotalAmmoniaNitrogen => Some(IdealRange { min: 0.0, max: 0.5 }),
            ParameterKey::Nitrite => Some(IdealRange { min: 0.0, max: 0.2 }),
            ParameterKey::Salinity => Some(IdealRange { min: 5.0, max: 30.0 }),
            ParameterKey::Temperature => Some(IdealRange { min: 25.0, max: 32.0 }),
            _ => None,
        }
    }

    pub fn from_json_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.json_key() == key)
    }
}

/// Configured [min, max] band for classifying a parameter reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdealRange {
    pub min: f64,
    pub max: f64,
}

/// One report sheet's readings: all 15 parameters, each independently
/// nullable (absent or unreadable on the photographed sheet).
///
/// Once a reading set leaves extraction/validation it always carries all
/// 15 keys; there is no partial-key representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaterQualityParameters {
    pub p_h: Option<f64>,
    pub salinity: Option<f64>,
    pub co2: Option<f64>,
    pub hco3: Option<f64>,
    pub total_mg: Option<f64>,
    pub total_ca: Option<f64>,
    pub total_hardness: Option<f64>,
    pub total_ammonia_nitrogen: Option<f64>,
    pub unionized_ammonia: Option<f64>,
    pub dissolved_oxygen: Option<f64>,
    pub iron: Option<f64>,
    pub h2s: Option<f64>,
    pub nitrite: Option<f64>,
    pub temperature: Option<f64>,
    pub chlorine: Option<f64>,
}

impl WaterQualityParameters {
    pub fn get(&self, key: ParameterKey) -> Option<f64> {
        match key {
            ParameterKey::Ph => self.p_h,
            ParameterKey::Salinity => self.salinity,
            ParameterKey::Co2 => self.co2,
            ParameterKey::Hco3 => self.hco3,
            ParameterKey::TotalMg => self.total_mg,
            ParameterKey::TotalCa => self.total_ca,
            ParameterKey::TotalHardness => self.total_hardness,
            ParameterKey::TotalAmmoniaNitrogen => self.total_ammonia_nitrogen,
            ParameterKey::UnionizedAmmonia => self.unionized_ammonia,
            ParameterKey::DissolvedOxygen => self.dissolved_oxygen,
            ParameterKey::Iron => self.iron,
            ParameterKey::H2s => self.h2s,
            ParameterKey::Nitrite => self.nitrite,
            ParameterKey::Temperature => self.temperature,
            ParameterKey::Chlorine => self.chlorine,
        }
    }

    pub fn set(&mut self, key: ParameterKey, value: Option<f64>) {
        match key {
            ParameterKey::Ph => self.p_h = value,
            ParameterKey::Salinity => self.salinity = value,
            ParameterKey::Co2 => self.co2 = value,
            ParameterKey::Hco3 => self.hco3 = value,
            ParameterKey::TotalMg => self.total_mg = value,
            ParameterKey::TotalCa => self.total_ca = value,
            ParameterKey::TotalHardness => self.total_hardness = value,
            ParameterKey::TotalAmmoniaNitrogen => self.total_ammonia_nitrogen = value,
            ParameterKey::UnionizedAmmonia => self.unionized_ammonia = value,
            ParameterKey::DissolvedOxygen => self.dissolved_oxygen = value,
            ParameterKey::Iron => self.iron = value,
            ParameterKey::H2s => self.h2s = value,
            ParameterKey::Nitrite => self.nitrite = value,
            ParameterKey::Temperature => self.temperature = value,
            ParameterKey::Chlorine => self.chlorine = value,
        }
    }

    /// Readings that are actually present, in display order.
    pub fn present(&self) -> impl Iterator<Item = (ParameterKey, f64)> + '_ {
        ParameterKey::ALL
            .into_iter()
            .filter_map(|k| self.get(k).map(|v| (k, v)))
    }
}

/// Classify a single parameter reading against its configured range.
///
/// Rules:
/// - absent reading or no configured range: `Normal` (no opinion)
/// - below minimum: `Critical` for dissolved oxygen (low oxygen is
///   acute), `Warning` for everything else
/// - above maximum: `Critical` for total ammonia nitrogen and nitrite
///   when the value exceeds 1.5x the maximum, otherwise `Warning`
/// - inside the range: `Safe`
///
/// This feeds per-parameter display only; the report-level status is
/// whatever the extraction step assigned and is never reconciled here.
pub fn evaluate_parameter(key: ParameterKey, value: Option<f64>) -> ParameterStatus {
    let Some(value) = value else {
        return ParameterStatus::Normal;
    };
    let Some(range) = key.ideal_range() else {
        return ParameterStatus::Normal;
    };

    if value < range.min {
        if key == ParameterKey::DissolvedOxygen {
            ParameterStatus::Critical
        } else {
            ParameterStatus::Warning
        }
    } else if value > range.max {
        let acute = matches!(
            key,
            ParameterKey::TotalAmmoniaNitrogen | ParameterKey::Nitrite
        );
        if acute && value > range.max * 1.5 {
            ParameterStatus::Critical
        } else {
            ParameterStatus::Warning
        }
    } else {
        ParameterStatus::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keys_have_unique_json_names() {
        for key in ParameterKey::ALL {
            assert_eq!(ParameterKey::from_json_key(key.json_key()), Some(key));
        }
        assert_eq!(ParameterKey::from_json_key("ph"), None);
    }

    #[test]
    fn test_parameters_wire_field_names() {
        let mut params = WaterQualityParameters::default();
        params.set(ParameterKey::Ph, Some(8.0));
        params.set(ParameterKey::TotalAmmoniaNitrogen, Some(0.4));

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["pH"], 8.0);
        assert_eq!(json["totalAmmoniaNitrogen"], 0.4);
        assert!(json["dissolvedOxygen"].is_null());
        // All 15 keys always present, value or null.
        assert_eq!(json.as_object().unwrap().len(), 15);
    }

    #[test]
    fn test_get_set_round_trip_all_keys() {
        let mut params = WaterQualityParameters::default();
        for (i, key) in ParameterKey::ALL.into_iter().enumerate() {
            params.set(key, Some(i as f64));
        }
        for (i, key) in ParameterKey::ALL.into_iter().enumerate() {
            assert_eq!(params.get(key), Some(i as f64));
        }
        params.set(ParameterKey::Iron, None);
        assert_eq!(params.get(ParameterKey::Iron), None);
    }

    #[test]
    fn test_evaluate_null_is_normal() {
        for key in ParameterKey::ALL {
            assert_eq!(evaluate_parameter(key, None), ParameterStatus::Normal);
        }
    }

    #[test]
    fn test_evaluate_unconfigured_key_is_normal() {
        assert_eq!(
            evaluate_parameter(ParameterKey::Iron, Some(99.0)),
            ParameterStatus::Normal
        );
        assert_eq!(
            evaluate_parameter(ParameterKey::H2s, Some(0.0)),
            ParameterStatus::Normal
        );
    }

    #[test]
    fn test_evaluate_below_minimum() {
        // Low dissolved oxygen is acute.
        assert_eq!(
            evaluate_parameter(ParameterKey::DissolvedOxygen, Some(3.0)),
            ParameterStatus::Critical
        );
        assert_eq!(
            evaluate_parameter(ParameterKey::Ph, Some(6.0)),
            ParameterStatus::Warning
        );
        assert_eq!(
            evaluate_parameter(ParameterKey::Salinity, Some(1.0)),
            ParameterStatus::Warning
        );
    }

    #[test]
    fn test_evaluate_above_maximum() {
        // Ammonia max 0.5: 1.5x threshold is 0.75.
        assert_eq!(
            evaluate_parameter(ParameterKey::TotalAmmoniaNitrogen, Some(0.6)),
            ParameterStatus::Warning
        );
        assert_eq!(
            evaluate_parameter(ParameterKey::TotalAmmoniaNitrogen, Some(0.76)),
            ParameterStatus::Critical
        );
        // Nitrite max 0.2: 1.5x threshold is 0.3.
        assert_eq!(
            evaluate_parameter(ParameterKey::Nitrite, Some(0.3)),
            ParameterStatus::Warning
        );
        assert_eq!(
            evaluate_parameter(ParameterKey::Nitrite, Some(0.31)),
            ParameterStatus::Critical
        );
        // Non-nitrogen parameters never escalate above the max.
        assert_eq!(
            evaluate_parameter(ParameterKey::Temperature, Some(60.0)),
            ParameterStatus::Warning
        );
        assert_eq!(
            evaluate_parameter(ParameterKey::DissolvedOxygen, Some(40.0)),
            ParameterStatus::Warning
        );
    }

    #[test]
    fn test_evaluate_within_range() {
        assert_eq!(
            evaluate_parameter(ParameterKey::Ph, Some(8.0)),
            ParameterStatus::Safe
        );
        // Boundary values are in range.
        assert_eq!(
            evaluate_parameter(ParameterKey::DissolvedOxygen, Some(5.0)),
            ParameterStatus::Safe
        );
        assert_eq!(
            evaluate_parameter(ParameterKey::DissolvedOxygen, Some(10.0)),
            ParameterStatus::Safe
        );
    }

    #[test]
    fn test_present_respects_display_order() {
        let mut params = WaterQualityParameters::default();
        params.set(ParameterKey::Chlorine, Some(0.1));
        params.set(ParameterKey::Ph, Some(7.9));
        let present: Vec<ParameterKey> = params.present().map(|(k, _)| k).collect();
        assert_eq!(present, vec![ParameterKey::Ph, ParameterKey::Chlorine]);
    }
}
