//! Local persistence of the user profile and report history
//!
//! Two independent JSON entries under a data directory, mirroring the
//! storage layout of earlier releases: one profile object and one array
//! of report records. There is no versioning or migration scheme, and
//! writes are plain file replacements rather than transactions; a crash
//! mid-write leaves whichever entry was on disk before, which is
//! acceptable for a single-tenant, single-device store.

use std::fs;
use std::path::{Path, PathBuf};

use shared::{UserProfile, WaterReport};

use crate::error::{AppError, AppResult};

/// Storage key for the single user profile
pub const PROFILE_ENTRY: &str = "profile.json";

/// Storage key for the report history array
pub const REPORTS_ENTRY: &str = "reports.json";

/// Handle to the on-disk store. At most one profile exists per store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    /// Open (creating if needed) the store at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn entry_path(&self, entry: &str) -> PathBuf {
        self.data_dir.join(entry)
    }

    /// Load the persisted profile, if any.
    ///
    /// A corrupted entry is discarded: the file is removed and `None` is
    /// returned, so the application proceeds as if no prior data existed.
    pub fn load_profile(&self) -> Option<UserProfile> {
        self.load_entry(PROFILE_ENTRY)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> AppResult<()> {
        self.save_entry(PROFILE_ENTRY, profile)
    }

    /// Load the persisted report history, discarding a corrupted entry
    /// the same way as [`load_profile`](Self::load_profile).
    pub fn load_reports(&self) -> Vec<WaterReport> {
        self.load_entry(REPORTS_ENTRY).unwrap_or_default()
    }

    pub fn save_reports(&self, reports: &[WaterReport]) -> AppResult<()> {
        self.save_entry(REPORTS_ENTRY, &reports)
    }

    fn load_entry<T: serde::de::DeserializeOwned>(&self, entry: &str) -> Option<T> {
        let path = self.entry_path(entry);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(entry, error = %e, "failed to read store entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(entry, error = %e, "discarding corrupted store entry");
                clear_entry(&path);
                None
            }
        }
    }

    fn save_entry<T: serde::Serialize>(&self, entry: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::StorageError(format!("failed to encode {}: {}", entry, e)))?;
        fs::write(self.entry_path(entry), raw)
            .map_err(|e| AppError::StorageError(format!("failed to write {}: {}", entry, e)))?;
        tracing::debug!(entry, "store entry written");
        Ok(())
    }
}

fn clear_entry(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to clear store entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{FarmingType, ReportStatus, WaterQualityParameters};

    fn sample_profile() -> UserProfile {
        UserProfile {
            id: "user-1".to_string(),
            name: "Ravi".to_string(),
            phone_number: "9876543210".to_string(),
            farm_location: "Visakhapatnam".to_string(),
            farming_type: FarmingType::Shrimp,
            farm_size: "5 ponds".to_string(),
        }
    }

    #[test]
    fn test_profile_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();

        assert!(store.load_profile().is_none());
        let profile = sample_profile();
        store.save_profile(&profile).unwrap();

        // Re-open to simulate an app restart.
        let reopened = SessionStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load_profile(), Some(profile));
    }

    #[test]
    fn test_corrupted_profile_is_discarded_and_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();

        let path = dir.path().join(PROFILE_ENTRY);
        fs::write(&path, "{not valid json").unwrap();

        assert!(store.load_profile().is_none());
        assert!(!path.exists(), "corrupted entry should be cleared");
    }

    #[test]
    fn test_reports_round_trip_and_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();

        assert!(store.load_reports().is_empty());

        let report = WaterReport {
            id: "report-1".to_string(),
            user_id: "user-1".to_string(),
            timestamp: Utc::now(),
            parameters: WaterQualityParameters::default(),
            status: ReportStatus::Warning,
            suggestions: vec!["Aerate overnight.".to_string()],
            alerts: vec![],
            image_url: None,
            notes: Some("cloudy water".to_string()),
        };
        store.save_reports(std::slice::from_ref(&report)).unwrap();

        let loaded = store.load_reports();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], report);
    }

    #[test]
    fn test_corrupted_reports_fall_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();

        fs::write(dir.path().join(REPORTS_ENTRY), "[[[").unwrap();
        assert!(store.load_reports().is_empty());
        assert!(!dir.path().join(REPORTS_ENTRY).exists());
    }
}
