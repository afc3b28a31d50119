use serde::Serialize;

use crate::models::delivery::{DeliveryRequest, DeliveryStatus};

/// The sole drone in this demo's fleet. Modeled as an id on the request so a
/// multi-drone dispatcher stays a pure extension.
pub const DRONE_ID: &str = "DRN-001";
pub const DRONE_NAME: &str = "Courier One";

/// Fixed demo battery level; there is no real telemetry.
pub const DRONE_BATTERY_PERCENT: u8 = 85;

/// View of the drone derived from the active request. Never stored: the
/// request's status is the source of truth and the drone mirrors it, falling
/// back to `Idle` when nothing is assigned.
#[derive(Debug, Clone, Serialize)]
pub struct Drone {
    pub id: &'static str,
    pub name: &'static str,
    pub status: DeliveryStatus,
    pub battery_level: u8,
    pub eta_minutes: Option<u32>,
}

impl Drone {
    pub fn for_request(active: Option<&DeliveryRequest>) -> Self {
        Self {
            id: DRONE_ID,
            name: DRONE_NAME,
            status: active.map_or(DeliveryStatus::Idle, |request| request.status),
            battery_level: DRONE_BATTERY_PERCENT,
            eta_minutes: active.map(|request| request.eta_minutes),
        }
    }
}
