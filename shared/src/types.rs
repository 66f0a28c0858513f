//! Common enums used across the platform

use serde::{Deserialize, Serialize};

/// Kind of aquaculture operation a farm runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FarmingType {
    Shrimp,
    Fish,
    Other,
}

impl FarmingType {
    pub const ALL: [FarmingType; 3] = [FarmingType::Shrimp, FarmingType::Fish, FarmingType::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            FarmingType::Shrimp => "Shrimp",
            FarmingType::Fish => "Fish",
            FarmingType::Other => "Other",
        }
    }

    /// Parse a user-supplied farming type, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shrimp" => Some(FarmingType::Shrimp),
            "fish" => Some(FarmingType::Fish),
            "other" => Some(FarmingType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for FarmingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall status of a water report, assigned by the extraction step.
///
/// This is taken verbatim from the AI reply and is never recomputed from
/// the per-parameter statuses (see [`crate::models::evaluate_parameter`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportStatus {
    Safe,
    Warning,
    Critical,
    Unknown,
}

impl ReportStatus {
    /// Lenient constructor for strings coming off the wire; anything
    /// outside the enumerated set collapses to `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "Safe" => ReportStatus::Safe,
            "Warning" => ReportStatus::Warning,
            "Critical" => ReportStatus::Critical,
            _ => ReportStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Safe => "Safe",
            ReportStatus::Warning => "Warning",
            ReportStatus::Critical => "Critical",
            ReportStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single parameter reading against its ideal range.
///
/// `Normal` means "no opinion": the value is absent or the parameter has
/// no configured range. It is deliberately distinct from `Safe`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParameterStatus {
    Safe,
    Warning,
    Critical,
    Normal,
}

impl std::fmt::Display for ParameterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParameterStatus::Safe => "Safe",
            ParameterStatus::Warning => "Warning",
            ParameterStatus::Critical => "Critical",
            ParameterStatus::Normal => "Normal",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farming_type_parse() {
        assert_eq!(FarmingType::parse("Shrimp"), Some(FarmingType::Shrimp));
        assert_eq!(FarmingType::parse("  fish "), Some(FarmingType::Fish));
        assert_eq!(FarmingType::parse("OTHER"), Some(FarmingType::Other));
        assert_eq!(FarmingType::parse("cattle"), None);
    }

    #[test]
    fn test_every_farming_type_choice_parses_back() {
        // The registration prompt renders ALL in lowercase; each choice
        // must round-trip through parse.
        for choice in FarmingType::ALL {
            let rendered = choice.as_str().to_ascii_lowercase();
            assert_eq!(FarmingType::parse(&rendered), Some(choice));
        }
    }

    #[test]
    fn test_report_status_from_wire() {
        assert_eq!(ReportStatus::from_wire("Safe"), ReportStatus::Safe);
        assert_eq!(ReportStatus::from_wire("Critical"), ReportStatus::Critical);
        assert_eq!(ReportStatus::from_wire("safe"), ReportStatus::Unknown);
        assert_eq!(ReportStatus::from_wire("garbage"), ReportStatus::Unknown);
    }

    #[test]
    fn test_report_status_serde_strings() {
        let json = serde_json::to_string(&ReportStatus::Warning).unwrap();
        assert_eq!(json, "\"Warning\"");
        let back: ReportStatus = serde_json::from_str("\"Unknown\"").unwrap();
        assert_eq!(back, ReportStatus::Unknown);
    }
}
