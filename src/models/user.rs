use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::delivery::DeliveryRequest;
use crate::models::location::Location;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    /// Default pickup location offered by the request screen.
    pub home_address: Location,
    /// Completed deliveries, most recent first. Append-only snapshots.
    pub delivery_history: Vec<DeliveryRequest>,
}

/// Partial update merged into the current user by `update_profile`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub home_address: Option<Location>,
}
