//! User profile model

use serde::{Deserialize, Serialize};

use crate::types::FarmingType;

/// A farmer's profile, created once at registration.
///
/// Immutable after creation in the current version. Serialized with the
/// camelCase field names the persisted store has always used, so a store
/// written by an earlier release round-trips unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    /// Free text; also used as the weather lookup key.
    pub farm_location: String,
    pub farming_type: FarmingType,
    /// Free text, e.g. "10 acres" or "5 ponds".
    pub farm_size: String,
}
