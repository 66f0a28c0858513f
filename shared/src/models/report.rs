//! Water report records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::WaterQualityParameters;
use crate::types::ReportStatus;

/// One farm inspection event: the analyzed readings from a photographed
/// lab sheet, plus the AI's overall status and suggestions.
///
/// Mutable only while it is the draft of the edit stage; frozen once
/// appended to the report history, and never updated or deleted after
/// that. The creation timestamp is the sole ordering key, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaterReport {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub parameters: WaterQualityParameters,
    /// Assigned verbatim by the extraction step; not recomputed from the
    /// per-parameter evaluator.
    pub status: ReportStatus,
    pub suggestions: Vec<String>,
    /// Reserved; always empty in the current flow.
    pub alerts: Vec<String>,
    /// Data URI of the uploaded report photo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Re-sort a report history newest-first.
///
/// Insertion order is not trusted; every save re-sorts by timestamp so
/// the first element is always the latest inspection.
pub fn sort_newest_first(reports: &mut [WaterReport]) {
    reports.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report_at(id: &str, ts: DateTime<Utc>) -> WaterReport {
        WaterReport {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            timestamp: ts,
            parameters: WaterQualityParameters::default(),
            status: ReportStatus::Safe,
            suggestions: vec![],
            alerts: vec![],
            image_url: None,
            notes: None,
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        let mut reports = vec![report_at("a", t1), report_at("b", t2), report_at("c", t3)];
        sort_newest_first(&mut reports);
        let ids: Vec<&str> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_report_wire_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let mut report = report_at("report-1", ts);
        report.suggestions = vec!["Monitor pH levels closely.".to_string()];
        report.notes = Some("after heavy rain".to_string());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["status"], "Safe");
        assert!(json["timestamp"].as_str().unwrap().starts_with("2024-06-01T12:30:00"));
        // Absent image stays absent rather than serializing null.
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_report_deserializes_legacy_store_entry() {
        // Shape of an entry written by the original application.
        let raw = r#"{
            "id": "report-1716000000000",
            "userId": "user-1700000000000",
            "timestamp": "2024-05-18T04:00:00.000Z",
            "parameters": {
                "pH": 8.1, "salinity": 12, "co2": null, "hco3": 120,
                "totalMg": null, "totalCa": null, "totalHardness": 180,
                "totalAmmoniaNitrogen": 0.3, "unionizedAmmonia": null,
                "dissolvedOxygen": 6.2, "iron": null, "h2s": null,
                "nitrite": 0.1, "temperature": 29, "chlorine": null
            },
            "status": "Safe",
            "suggestions": ["Maintain aeration."],
            "alerts": [],
            "notes": ""
        }"#;
        let report: WaterReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.status, ReportStatus::Safe);
        assert_eq!(report.parameters.p_h, Some(8.1));
        assert_eq!(report.parameters.co2, None);
        assert_eq!(report.image_url, None);
    }
}
