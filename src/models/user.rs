//! Resident profile synced from the identity provider.

use crate::models::ward::WardNumber;
use serde::{Deserialize, Serialize};

/// Resident profile stored in Firestore (document ID = `user_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    /// Identity provider subject
    pub user_id: String,
    pub name: Option<String>,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Home ward, normalized to a number at sync time
    pub ward: Option<WardNumber>,
    /// Inactive residents receive no notifications
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}
