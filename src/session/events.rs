use serde::Serialize;
use uuid::Uuid;

use crate::models::delivery::{DeliveryRequest, DeliveryStatus};
use crate::models::user::User;

/// Published on the session's broadcast channel after every mutation, before
/// the mutating call returns. Screens and the lifecycle driver subscribe.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    UserUpdated {
        user: User,
    },
    DeliveryCreated {
        request: DeliveryRequest,
    },
    StatusChanged {
        request: DeliveryRequest,
        from: DeliveryStatus,
    },
    EtaUpdated {
        request_id: Uuid,
        eta_minutes: u32,
    },
    DeliveryCompleted {
        request: DeliveryRequest,
    },
    SessionCleared,
}
