use crate::error::AppError;
use crate::models::delivery::DeliveryStatus;

/// The single legal outgoing edge for each state.
///
/// ```text
/// Arriving --(arrival timer)--> PendingPickup
/// PendingPickup --(user confirms)--> InFlight
/// InFlight --(flight timer)--> Delivered
/// ```
pub fn next(from: DeliveryStatus) -> Option<DeliveryStatus> {
    match from {
        DeliveryStatus::Arriving => Some(DeliveryStatus::PendingPickup),
        DeliveryStatus::PendingPickup => Some(DeliveryStatus::InFlight),
        DeliveryStatus::InFlight => Some(DeliveryStatus::Delivered),
        DeliveryStatus::Idle | DeliveryStatus::Delivered => None,
    }
}

/// Rejects everything but the single legal edge, so callers never re-check
/// the graph themselves.
pub fn validate(from: DeliveryStatus, attempted: DeliveryStatus) -> Result<(), AppError> {
    if next(from) == Some(attempted) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, attempted })
    }
}
