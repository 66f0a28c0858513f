//! Report session state machine
//!
//! Owns everything the user sees: the current view, the signed-in
//! profile, the report history, and the transient weather and threat
//! state. All mutation happens through the methods here, one event at a
//! time; remote calls write into disjoint fields so completions that
//! arrive late never race each other.
//!
//! Validation failures are local and non-fatal: the method returns the
//! error for inline display and the session stays in its previous state.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;

use shared::{
    sort_newest_first, validate_phone_number, DayForecast, FarmingType, ParameterKey, UserProfile,
    WaterReport,
};

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::external::gemini::GeminiClient;
use crate::external::weather::WeatherClient;
use crate::store::SessionStore;

/// An image selected for analysis, held in memory until saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub base64: String,
    pub mime_type: String,
}

impl UploadedImage {
    /// Data-URI form, embedded into the saved report.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Registration form contents, pre-filled with the verified phone number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub phone_number: String,
    pub name: String,
    pub farm_location: String,
    pub farming_type: Option<FarmingType>,
    pub farm_size: String,
}

/// The screen the user is currently on.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Entry,
    OtpVerification { phone_number: String, otp_sent: bool },
    Registration { form: RegistrationForm },
    Dashboard,
    UploadReport { image: Option<UploadedImage> },
    EditAnalysis { draft: WaterReport },
    ViewAnalysis { report_id: String },
    PastReports,
}

impl View {
    /// Views that only make sense with a signed-in profile.
    fn requires_profile(&self) -> bool {
        !matches!(
            self,
            View::Entry | View::OtpVerification { .. } | View::Registration { .. }
        )
    }
}

/// One user's session, backed by the local store.
#[derive(Debug)]
pub struct Session {
    store: SessionStore,
    mock_otp: String,
    otp_latency: Duration,
    profile: Option<UserProfile>,
    reports: Vec<WaterReport>,
    view: View,
    weather: Vec<DayForecast>,
    threat_narrative: Option<String>,
    threat_error: Option<String>,
}

impl Session {
    /// Start a session at the entry screen. Report history is loaded up
    /// front; the profile is only consulted after OTP verification.
    pub fn new(store: SessionStore, auth: &AuthConfig) -> Self {
        let mut reports = store.load_reports();
        sort_newest_first(&mut reports);
        Self {
            store,
            mock_otp: auth.mock_otp.clone(),
            otp_latency: Duration::from_millis(auth.otp_latency_ms),
            profile: None,
            reports,
            view: View::Entry,
            weather: Vec::new(),
            threat_narrative: None,
            threat_error: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Saved reports, newest first.
    pub fn reports(&self) -> &[WaterReport] {
        &self.reports
    }

    pub fn weather(&self) -> &[DayForecast] {
        &self.weather
    }

    pub fn threat_narrative(&self) -> Option<&str> {
        self.threat_narrative.as_deref()
    }

    pub fn threat_error(&self) -> Option<&str> {
        self.threat_error.as_deref()
    }

    /// The report shown by the current view, if it shows one.
    pub fn current_report(&self) -> Option<&WaterReport> {
        match &self.view {
            View::EditAnalysis { draft } => Some(draft),
            View::ViewAnalysis { report_id } => {
                self.reports.iter().find(|r| &r.id == report_id)
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Authentication flow
    // ------------------------------------------------------------------

    /// Request a one-time code for `phone_number`.
    ///
    /// Validates the number, simulates provider latency, then marks the
    /// code as sent. Callable again from the verification screen to
    /// resend.
    pub async fn send_otp(&mut self, phone_number: &str) -> AppResult<()> {
        if !matches!(self.view, View::Entry | View::OtpVerification { .. }) {
            return Err(AppError::InvalidStateTransition(
                "OTP can only be requested from the entry screen".to_string(),
            ));
        }

        validate_phone_number(phone_number)
            .map_err(|message| AppError::validation("phone_number", message))?;

        tokio::time::sleep(self.otp_latency).await;
        tracing::info!(phone_number, "mock OTP sent");
        self.view = View::OtpVerification {
            phone_number: phone_number.to_string(),
            otp_sent: true,
        };
        Ok(())
    }

    /// Abandon verification or registration and return to the entry
    /// screen, dropping the transient auth fields.
    pub fn back_to_entry(&mut self) {
        if matches!(
            self.view,
            View::OtpVerification { .. } | View::Registration { .. }
        ) {
            self.view = View::Entry;
        }
    }

    /// Check the entered code against the mock value.
    ///
    /// A mismatch reports an error without changing state; the caller
    /// clears its code input. A match loads the stored profile: if its
    /// phone number matches, the user lands on the dashboard, otherwise
    /// on registration pre-filled with the number.
    pub fn verify_otp(&mut self, code: &str) -> AppResult<()> {
        let phone_number = match &self.view {
            View::OtpVerification {
                phone_number,
                otp_sent: true,
            } => phone_number.clone(),
            _ => {
                return Err(AppError::InvalidStateTransition(
                    "no OTP has been sent".to_string(),
                ))
            }
        };

        if code != self.mock_otp {
            return Err(AppError::validation("otp", "Invalid OTP. Please try again."));
        }

        match self.store.load_profile() {
            Some(profile) if profile.phone_number == phone_number => {
                tracing::info!(user_id = %profile.id, "existing user verified");
                self.profile = Some(profile);
                self.view = View::Dashboard;
            }
            _ => {
                self.view = View::Registration {
                    form: RegistrationForm {
                        phone_number,
                        ..RegistrationForm::default()
                    },
                };
            }
        }
        Ok(())
    }

    /// Submit the registration form. All fields are required; the
    /// profile id is synthesized from the current time.
    pub fn register(&mut self, form: &RegistrationForm) -> AppResult<()> {
        if !matches!(self.view, View::Registration { .. }) {
            return Err(AppError::InvalidStateTransition(
                "not on the registration screen".to_string(),
            ));
        }

        require_field("name", &form.name)?;
        require_field("farm_location", &form.farm_location)?;
        let farming_type = form
            .farming_type
            .ok_or_else(|| AppError::validation("farming_type", "This field is required"))?;
        require_field("farm_size", &form.farm_size)?;

        let profile = UserProfile {
            id: clock_id("user"),
            name: form.name.trim().to_string(),
            phone_number: form.phone_number.clone(),
            farm_location: form.farm_location.trim().to_string(),
            farming_type,
            farm_size: form.farm_size.trim().to_string(),
        };

        if let Err(e) = self.store.save_profile(&profile) {
            tracing::warn!(error = %e, "failed to persist profile");
        }
        tracing::info!(user_id = %profile.id, "new user registered");
        self.profile = Some(profile);
        self.view = View::Dashboard;
        Ok(())
    }

    /// Drop the in-memory profile and transient state and return to the
    /// entry screen. Persisted storage is untouched, so the profile
    /// reloads on the next verification.
    pub fn logout(&mut self) {
        self.profile = None;
        self.weather.clear();
        self.clear_threat_state();
        self.view = View::Entry;
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn open_dashboard(&mut self) {
        self.clear_threat_state();
        if self.ensure_profile() {
            self.view = View::Dashboard;
        }
    }

    pub fn open_upload(&mut self) {
        self.clear_threat_state();
        if self.ensure_profile() {
            self.view = View::UploadReport { image: None };
        }
    }

    pub fn open_past_reports(&mut self) {
        self.clear_threat_state();
        if self.ensure_profile() {
            self.view = View::PastReports;
        }
    }

    /// Open a saved report. Clears any stale threat narrative; the
    /// caller re-triggers the weather and threat fetches.
    pub fn view_report(&mut self, report_id: &str) -> AppResult<()> {
        if !self.ensure_profile() {
            return Err(AppError::InvalidStateTransition(
                "no signed-in profile".to_string(),
            ));
        }
        if !self.reports.iter().any(|r| r.id == report_id) {
            return Err(AppError::NotFound(format!("report {}", report_id)));
        }
        self.clear_threat_state();
        self.view = View::ViewAnalysis {
            report_id: report_id.to_string(),
        };
        Ok(())
    }

    /// Leave the report view. Lands on the history when there is more
    /// than one report, otherwise back on the dashboard.
    pub fn close_report(&mut self) {
        self.clear_threat_state();
        if !self.ensure_profile() {
            return;
        }
        self.view = if self.reports.len() > 1 {
            View::PastReports
        } else {
            View::Dashboard
        };
    }

    /// Defensive fallback: a profile-requiring view without a profile
    /// resets to the entry screen.
    pub fn recover(&mut self) {
        if self.view.requires_profile() && self.profile.is_none() {
            tracing::warn!("session view requires a profile but none is loaded, resetting");
            self.view = View::Entry;
        }
    }

    // ------------------------------------------------------------------
    // Upload and analysis
    // ------------------------------------------------------------------

    /// Select an image on the upload screen.
    pub fn attach_image(&mut self, bytes: &[u8], mime_type: &str) -> AppResult<()> {
        match &mut self.view {
            View::UploadReport { image } => {
                *image = Some(UploadedImage {
                    base64: BASE64.encode(bytes),
                    mime_type: mime_type.to_string(),
                });
                Ok(())
            }
            _ => Err(AppError::InvalidStateTransition(
                "not on the upload screen".to_string(),
            )),
        }
    }

    /// Run AI extraction over the selected image and move to editing.
    ///
    /// The draft report is not persisted until [`save_report`]
    /// (Self::save_report); on failure the upload screen is left as it
    /// was, image included, so the user can retry.
    pub async fn analyze(&mut self, client: &GeminiClient) -> AppResult<()> {
        let (image, user_id) = match (&self.view, &self.profile) {
            (View::UploadReport { image: Some(image) }, Some(profile)) => {
                (image.clone(), profile.id.clone())
            }
            (View::UploadReport { image: None }, _) => {
                return Err(AppError::validation(
                    "image",
                    "Please select a report image first",
                ))
            }
            _ => {
                return Err(AppError::InvalidStateTransition(
                    "not on the upload screen".to_string(),
                ))
            }
        };

        let extraction = client
            .analyze_report_image(&image.base64, &image.mime_type)
            .await?;

        let draft = WaterReport {
            id: clock_id("report"),
            user_id,
            timestamp: Utc::now(),
            parameters: extraction.parameters,
            status: extraction.status,
            suggestions: extraction.suggestions,
            alerts: Vec::new(),
            image_url: Some(image.data_uri()),
            notes: None,
        };
        self.view = View::EditAnalysis { draft };
        Ok(())
    }

    /// Overwrite one parameter of the draft from raw user input.
    /// Non-numeric input clears the value to null rather than erroring;
    /// NaN and the infinities count as non-numeric (they are not real
    /// readings and would not survive JSON storage).
    pub fn set_parameter(&mut self, key: ParameterKey, raw: &str) -> AppResult<()> {
        match &mut self.view {
            View::EditAnalysis { draft } => {
                let value = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite());
                draft.parameters.set(key, value);
                Ok(())
            }
            _ => Err(AppError::InvalidStateTransition(
                "no draft report to edit".to_string(),
            )),
        }
    }

    pub fn set_notes(&mut self, notes: &str) -> AppResult<()> {
        match &mut self.view {
            View::EditAnalysis { draft } => {
                let trimmed = notes.trim();
                draft.notes = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                };
                Ok(())
            }
            _ => Err(AppError::InvalidStateTransition(
                "no draft report to edit".to_string(),
            )),
        }
    }

    /// Commit the draft: prepend to history, re-sort newest first,
    /// persist, and show the saved report. The write is fire-and-forget;
    /// a storage failure is logged and the in-memory state stands.
    pub fn save_report(&mut self) -> AppResult<()> {
        let draft = match &self.view {
            View::EditAnalysis { draft } => draft.clone(),
            _ => {
                return Err(AppError::InvalidStateTransition(
                    "no draft report to save".to_string(),
                ))
            }
        };

        let report_id = draft.id.clone();
        self.reports.insert(0, draft);
        sort_newest_first(&mut self.reports);
        if let Err(e) = self.store.save_reports(&self.reports) {
            tracing::warn!(error = %e, "failed to persist report history");
        }

        self.clear_threat_state();
        self.view = View::ViewAnalysis { report_id };
        Ok(())
    }

    // ------------------------------------------------------------------
    // Side effects around ViewAnalysis
    // ------------------------------------------------------------------

    /// Fetch the forecast for the profile's farm location. A provider
    /// failure degrades to an empty forecast rather than an error; the
    /// threat fetch then simply stays off.
    pub async fn refresh_weather(&mut self, client: &WeatherClient) {
        let location = match &self.profile {
            Some(profile) => profile.farm_location.clone(),
            None => return,
        };
        self.weather = match client.get_forecast(&location).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!(error = %e, "weather fetch failed");
                Vec::new()
            }
        };
    }

    /// Fetch the threat narrative for the report being viewed.
    ///
    /// Runs only when a profile, the viewed report, and a non-empty
    /// forecast are all available; otherwise it is a no-op. Returns
    /// whether a fetch was attempted.
    pub async fn maybe_refresh_threat(&mut self, client: &GeminiClient) -> bool {
        let report_id = match &self.view {
            View::ViewAnalysis { report_id } => report_id.clone(),
            _ => return false,
        };
        let (profile, report) = match (
            &self.profile,
            self.reports.iter().find(|r| r.id == report_id),
        ) {
            (Some(profile), Some(report)) => (profile.clone(), report.clone()),
            _ => return false,
        };
        if self.weather.is_empty() {
            return false;
        }

        match client
            .threat_assessment(&profile, &report, &self.weather)
            .await
        {
            Ok(narrative) => {
                self.threat_narrative = Some(narrative);
                self.threat_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "threat assessment failed");
                self.threat_error = Some(e.to_string());
            }
        }
        true
    }

    // ------------------------------------------------------------------

    fn clear_threat_state(&mut self) {
        self.threat_narrative = None;
        self.threat_error = None;
    }

    /// True when a profile is loaded; otherwise resets to the entry
    /// screen and returns false.
    fn ensure_profile(&mut self) -> bool {
        if self.profile.is_some() {
            true
        } else {
            self.view = View::Entry;
            false
        }
    }
}

fn require_field(field: &str, value: &str) -> AppResult<()> {
    shared::require_non_empty(value, "This field is required")
        .map_err(|message| AppError::validation(field, message))
}

/// Synthesize an id from the current time, e.g. `report-1724999999999`.
fn clock_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::{ReportStatus, WaterQualityParameters};

    fn test_session(dir: &std::path::Path) -> Session {
        let store = SessionStore::open(dir).unwrap();
        let auth = AuthConfig {
            mock_otp: "1234".to_string(),
            otp_latency_ms: 0,
        };
        Session::new(store, &auth)
    }

    fn test_profile() -> UserProfile {
        UserProfile {
            id: "user-1".to_string(),
            name: "Lakshmi".to_string(),
            phone_number: "9876543210".to_string(),
            farm_location: "Visakhapatnam".to_string(),
            farming_type: FarmingType::Shrimp,
            farm_size: "2 acres".to_string(),
        }
    }

    fn draft(id: &str, ts_millis: i64) -> WaterReport {
        WaterReport {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            timestamp: Utc.timestamp_millis_opt(ts_millis).single().unwrap(),
            parameters: WaterQualityParameters::default(),
            status: ReportStatus::Safe,
            suggestions: vec![],
            alerts: vec![],
            image_url: None,
            notes: None,
        }
    }

    #[test]
    fn test_edit_draft_parameters_and_notes() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        session.profile = Some(test_profile());
        session.view = View::EditAnalysis {
            draft: draft("report-1", 1_000),
        };

        session.set_parameter(ParameterKey::Ph, "7.9").unwrap();
        session.set_parameter(ParameterKey::Nitrite, "  0.1 ").unwrap();
        // Non-numeric input clears to null instead of erroring.
        session.set_parameter(ParameterKey::Ph, "not a number").unwrap();
        session.set_notes("slightly turbid").unwrap();

        let View::EditAnalysis { draft } = &session.view else {
            panic!("left edit view");
        };
        assert_eq!(draft.parameters.p_h, None);
        assert_eq!(draft.parameters.nitrite, Some(0.1));
        assert_eq!(draft.notes.as_deref(), Some("slightly turbid"));
    }

    #[test]
    fn test_non_finite_input_clears_to_null() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        session.profile = Some(test_profile());
        session.view = View::EditAnalysis {
            draft: draft("report-1", 1_000),
        };

        // f64::parse accepts these spellings, but they are not readings.
        for raw in ["NaN", "nan", "inf", "-inf", "infinity"] {
            session.set_parameter(ParameterKey::Ph, "7.9").unwrap();
            session.set_parameter(ParameterKey::Ph, raw).unwrap();
            let View::EditAnalysis { draft } = &session.view else {
                panic!("left edit view");
            };
            assert_eq!(draft.parameters.p_h, None, "input {:?}", raw);
        }

        session.set_parameter(ParameterKey::Ph, "8.1").unwrap();
        let View::EditAnalysis { draft } = &session.view else {
            panic!("left edit view");
        };
        assert_eq!(draft.parameters.p_h, Some(8.1));
    }

    #[test]
    fn test_save_sorts_newest_first_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        session.profile = Some(test_profile());

        session.view = View::EditAnalysis {
            draft: draft("report-t2", 2_000),
        };
        session.save_report().unwrap();
        assert_eq!(
            session.view,
            View::ViewAnalysis {
                report_id: "report-t2".to_string()
            }
        );

        // An older report saved later still lands behind the newer one.
        session.view = View::EditAnalysis {
            draft: draft("report-t1", 1_000),
        };
        session.save_report().unwrap();

        let ids: Vec<&str> = session.reports().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["report-t2", "report-t1"]);

        let reopened = SessionStore::open(dir.path()).unwrap();
        let persisted: Vec<String> = reopened
            .load_reports()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(persisted, vec!["report-t2", "report-t1"]);
    }

    #[test]
    fn test_edit_outside_edit_view_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        assert!(matches!(
            session.set_parameter(ParameterKey::Ph, "7.0"),
            Err(AppError::InvalidStateTransition(_))
        ));
        assert!(matches!(
            session.save_report(),
            Err(AppError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_close_report_destination_depends_on_history_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        session.profile = Some(test_profile());

        session.view = View::EditAnalysis {
            draft: draft("report-1", 1_000),
        };
        session.save_report().unwrap();
        session.close_report();
        assert_eq!(session.view, View::Dashboard);

        session.view = View::EditAnalysis {
            draft: draft("report-2", 2_000),
        };
        session.save_report().unwrap();
        session.close_report();
        assert_eq!(session.view, View::PastReports);
    }

    #[test]
    fn test_recover_resets_profileless_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        session.view = View::Dashboard;
        session.recover();
        assert_eq!(session.view, View::Entry);

        session.profile = Some(test_profile());
        session.view = View::Dashboard;
        session.recover();
        assert_eq!(session.view, View::Dashboard);
    }
}
