use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::lifecycle::transitions;
use crate::models::delivery::{DeliveryRequest, DeliveryStatus};
use crate::models::drone::{Drone, DRONE_ID};
use crate::models::location::Location;
use crate::models::user::{ProfileUpdate, User};
use crate::session::events::SessionEvent;

pub const PASSWORD_MIN_LEN: usize = 6;
pub const DELIVERY_LEAD_MINUTES: i64 = 15;
pub const INITIAL_ETA_MINUTES: u32 = 15;
pub const POST_PICKUP_ETA_MINUTES: u32 = 10;

#[derive(Default)]
struct Session {
    user: Option<User>,
    active: Option<DeliveryRequest>,
}

/// Single source of truth for the logged-in user and the one in-flight
/// delivery. Every mutation runs to completion under the write lock and
/// publishes a [`SessionEvent`] before returning, so subscribers always see
/// transitions in the order they were applied.
pub struct SessionStore {
    inner: RwLock<Session>,
    events_tx: broadcast::Sender<SessionEvent>,
    auth_latency: Duration,
    request_latency: Duration,
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            inner: RwLock::new(Session::default()),
            events_tx,
            auth_latency: Duration::from_millis(config.auth_latency_ms),
            request_latency: Duration::from_millis(config.request_latency_ms),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Stand-in credential check: any non-empty email/password pair passes.
    /// A registered user keeps their identity across retries; otherwise a
    /// stock demo profile is installed with the given email.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        sleep(self.auth_latency).await;

        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredential);
        }

        let mut session = self.write();
        let user = match session.user.take() {
            Some(mut existing) => {
                existing.email = email.to_string();
                existing
            }
            None => demo_user(email),
        };
        session.user = Some(user.clone());
        self.publish(SessionEvent::UserUpdated { user: user.clone() });

        info!(user_id = %user.id, "user authenticated");
        Ok(user)
    }

    /// Creates an account with an empty delivery history. Fields are checked
    /// in a fixed order and the first failure wins.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
        home_address: Location,
    ) -> Result<User, AppError> {
        sleep(self.auth_latency).await;

        validate_registration(name, email, password, confirm_password, &home_address)?;

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            avatar: None,
            home_address,
            delivery_history: Vec::new(),
        };

        let mut session = self.write();
        session.user = Some(user.clone());
        self.publish(SessionEvent::UserUpdated { user: user.clone() });

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub fn update_profile(&self, update: ProfileUpdate) -> Result<User, AppError> {
        let mut session = self.write();
        let user = session.user.as_mut().ok_or(AppError::NotAuthenticated)?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(home_address) = update.home_address {
            user.home_address = home_address;
        }

        let user = user.clone();
        self.publish(SessionEvent::UserUpdated { user: user.clone() });
        Ok(user)
    }

    /// Clears both the user and the active request. Armed timers observe the
    /// `SessionCleared` event and stand down.
    pub fn logout(&self) {
        let mut session = self.write();
        session.user = None;
        session.active = None;
        self.publish(SessionEvent::SessionCleared);
        info!("session cleared");
    }

    pub async fn create_delivery(
        &self,
        pickup: Location,
        delivery: Location,
    ) -> Result<DeliveryRequest, AppError> {
        sleep(self.request_latency).await;

        let mut session = self.write();
        let user = session.user.as_ref().ok_or(AppError::NotAuthenticated)?;

        if session.active.is_some() {
            return Err(AppError::Conflict(
                "a delivery is already in progress".to_string(),
            ));
        }
        if pickup.address.trim().is_empty() {
            return Err(AppError::Validation {
                field: "pickup.address",
            });
        }
        if delivery.address.trim().is_empty() {
            return Err(AppError::Validation {
                field: "delivery.address",
            });
        }

        let now = Utc::now();
        let request = DeliveryRequest {
            id: Uuid::new_v4(),
            user_id: user.id,
            pickup,
            delivery,
            status: DeliveryStatus::Arriving,
            drone_id: DRONE_ID.to_string(),
            created_at: now,
            estimated_arrival: now + ChronoDuration::minutes(DELIVERY_LEAD_MINUTES),
            eta_minutes: INITIAL_ETA_MINUTES,
        };

        session.active = Some(request.clone());
        self.publish(SessionEvent::DeliveryCreated {
            request: request.clone(),
        });

        info!(request_id = %request.id, drone_id = %request.drone_id, "delivery created");
        Ok(request)
    }

    /// Applies the single legal outgoing edge for the current state; anything
    /// else is rejected. Reaching `Delivered` archives the request into the
    /// user's history and clears the active slot in the same critical section.
    pub fn transition_status(&self, target: DeliveryStatus) -> Result<DeliveryRequest, AppError> {
        let mut session = self.write();
        self.apply_transition(&mut session, target)
    }

    /// The one user-driven transition. Legal only from `PendingPickup`.
    pub fn confirm_pickup(&self) -> Result<DeliveryRequest, AppError> {
        let mut session = self.write();
        self.apply_transition(&mut session, DeliveryStatus::InFlight)
    }

    /// Timer-path transition: applies only while the identified request is
    /// still active and still in `from`. A stale timer firing after the
    /// session moved on is a no-op, never an error.
    pub fn advance_if(
        &self,
        request_id: Uuid,
        from: DeliveryStatus,
        to: DeliveryStatus,
    ) -> Option<DeliveryRequest> {
        let mut session = self.write();
        let live = session
            .active
            .as_ref()
            .is_some_and(|request| request.id == request_id && request.status == from);
        if !live {
            return None;
        }

        self.apply_transition(&mut session, to).ok()
    }

    /// Decrements the advisory countdown for the identified request, clamped
    /// at zero. Returns `None` once the request is no longer active, which is
    /// the ticker's signal to stop.
    pub fn tick_eta(&self, request_id: Uuid) -> Option<u32> {
        let mut session = self.write();
        let request = session
            .active
            .as_mut()
            .filter(|request| request.id == request_id)?;

        request.eta_minutes = request.eta_minutes.saturating_sub(1);
        let eta_minutes = request.eta_minutes;
        self.publish(SessionEvent::EtaUpdated {
            request_id,
            eta_minutes,
        });
        Some(eta_minutes)
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn active_delivery(&self) -> Option<DeliveryRequest> {
        self.read().active.clone()
    }

    pub fn history(&self) -> Vec<DeliveryRequest> {
        self.read()
            .user
            .as_ref()
            .map(|user| user.delivery_history.clone())
            .unwrap_or_default()
    }

    pub fn drone(&self) -> Drone {
        Drone::for_request(self.read().active.as_ref())
    }

    fn apply_transition(
        &self,
        session: &mut RwLockWriteGuard<'_, Session>,
        target: DeliveryStatus,
    ) -> Result<DeliveryRequest, AppError> {
        let request = session
            .active
            .as_mut()
            .ok_or_else(|| AppError::NotFound("no active delivery".to_string()))?;

        let from = request.status;
        transitions::validate(from, target)?;

        request.status = target;
        if target == DeliveryStatus::InFlight {
            request.eta_minutes = POST_PICKUP_ETA_MINUTES;
        }
        let snapshot = request.clone();

        if target.is_terminal() {
            session.active = None;
            if let Some(user) = session.user.as_mut() {
                user.delivery_history.insert(0, snapshot.clone());
            }
            self.publish(SessionEvent::DeliveryCompleted {
                request: snapshot.clone(),
            });
        } else {
            self.publish(SessionEvent::StatusChanged {
                request: snapshot.clone(),
                from,
            });
        }

        info!(request_id = %snapshot.id, from = %from, to = %target, "delivery transitioned");
        Ok(snapshot)
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.read().expect("session lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.write().expect("session lock poisoned")
    }
}

fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
    home_address: &Location,
) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation { field: "name" });
    }
    if email.trim().is_empty() {
        return Err(AppError::Validation { field: "email" });
    }
    if password.is_empty() {
        return Err(AppError::Validation { field: "password" });
    }
    if password != confirm_password {
        return Err(AppError::Validation {
            field: "confirm_password",
        });
    }
    if password.len() < PASSWORD_MIN_LEN {
        return Err(AppError::Validation { field: "password" });
    }
    if home_address.address.trim().is_empty() {
        return Err(AppError::Validation {
            field: "home_address",
        });
    }
    Ok(())
}

fn demo_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: "Marco Rossi".to_string(),
        email: email.to_string(),
        avatar: None,
        home_address: Location {
            lat: 41.9028,
            lng: 12.4964,
            address: "Via Roma 123, Roma, Italia".to_string(),
        },
        delivery_history: Vec::new(),
    }
}
