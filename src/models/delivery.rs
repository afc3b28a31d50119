use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::Location;

/// Lifecycle states ordered by progress. `Idle` describes a drone with no
/// assigned request and never appears on an active request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeliveryStatus {
    Idle,
    Arriving,
    PendingPickup,
    InFlight,
    Delivered,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Delivered)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeliveryStatus::Idle => "Idle",
            DeliveryStatus::Arriving => "Arriving",
            DeliveryStatus::PendingPickup => "PendingPickup",
            DeliveryStatus::InFlight => "InFlight",
            DeliveryStatus::Delivered => "Delivered",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pickup: Location,
    pub delivery: Location,
    pub status: DeliveryStatus,
    pub drone_id: String,
    pub created_at: DateTime<Utc>,
    /// Advisory only; transitions are driven by timers and user action,
    /// never by this timestamp.
    pub estimated_arrival: DateTime<Utc>,
    /// Countdown shown to the user, in minutes. Clamped at zero.
    pub eta_minutes: u32,
}
