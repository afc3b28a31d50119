use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::delivery::DeliveryStatus;
use crate::session::events::SessionEvent;
use crate::state::AppState;

/// Timers currently armed for one request. Each state arms at most one
/// transition timer, so two automatic transitions can never race.
#[derive(Default)]
struct ArmedTimers {
    transition: Option<JoinHandle<()>>,
    eta: Option<JoinHandle<()>>,
}

impl ArmedTimers {
    fn abort_all(&mut self) {
        if let Some(handle) = self.transition.take() {
            handle.abort();
        }
        if let Some(handle) = self.eta.take() {
            handle.abort();
        }
    }
}

/// Drives active deliveries through the time-based edges of the lifecycle.
///
/// The driver consumes the store's event stream and owns every timer, keyed
/// by request id. Timers are aborted deterministically when the request
/// leaves the state that armed them, completes, or the session is cleared;
/// a timer that still manages to fire late finds its request gone and does
/// nothing.
pub async fn run_lifecycle_driver(
    state: Arc<AppState>,
    mut events_rx: broadcast::Receiver<SessionEvent>,
) {
    info!("lifecycle driver started");

    let timers: DashMap<Uuid, ArmedTimers> = DashMap::new();

    loop {
        match events_rx.recv().await {
            Ok(event) => handle_event(&state, &timers, event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "lifecycle driver lagged behind session events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    timers.retain(|_, armed| {
        armed.abort_all();
        false
    });
    warn!("lifecycle driver stopped: event channel closed");
}

fn handle_event(state: &Arc<AppState>, timers: &DashMap<Uuid, ArmedTimers>, event: SessionEvent) {
    match event {
        SessionEvent::DeliveryCreated { request } => {
            state.metrics.active_delivery.set(1);
            state
                .metrics
                .status_transitions_total
                .with_label_values(&[&request.status.to_string()])
                .inc();

            arm_transition(
                state,
                timers,
                request.id,
                DeliveryStatus::Arriving,
                DeliveryStatus::PendingPickup,
                state.config.arrival_delay(),
            );
            arm_eta_ticker(state, timers, request.id);
        }

        SessionEvent::StatusChanged { request, .. } => {
            state
                .metrics
                .status_transitions_total
                .with_label_values(&[&request.status.to_string()])
                .inc();

            if request.status == DeliveryStatus::InFlight {
                arm_transition(
                    state,
                    timers,
                    request.id,
                    DeliveryStatus::InFlight,
                    DeliveryStatus::Delivered,
                    state.config.flight_delay(),
                );
            } else if let Some(mut armed) = timers.get_mut(&request.id) {
                // The state we entered arms no timer; drop the spent one.
                if let Some(handle) = armed.transition.take() {
                    handle.abort();
                }
            }
        }

        SessionEvent::DeliveryCompleted { request } => {
            state.metrics.active_delivery.set(0);
            state
                .metrics
                .status_transitions_total
                .with_label_values(&[&request.status.to_string()])
                .inc();
            state
                .metrics
                .deliveries_total
                .with_label_values(&["delivered"])
                .inc();

            let elapsed = (Utc::now() - request.created_at).num_milliseconds().max(0);
            state
                .metrics
                .delivery_duration_seconds
                .observe(elapsed as f64 / 1000.0);

            if let Some((_, mut armed)) = timers.remove(&request.id) {
                armed.abort_all();
            }
        }

        SessionEvent::SessionCleared => {
            state.metrics.active_delivery.set(0);
            timers.retain(|_, armed| {
                armed.abort_all();
                false
            });
        }

        SessionEvent::EtaUpdated { .. } | SessionEvent::UserUpdated { .. } => {}
    }
}

fn arm_transition(
    state: &Arc<AppState>,
    timers: &DashMap<Uuid, ArmedTimers>,
    request_id: Uuid,
    from: DeliveryStatus,
    to: DeliveryStatus,
    delay: Duration,
) {
    let state = state.clone();
    let handle = tokio::spawn(async move {
        sleep(delay).await;
        match state.store.advance_if(request_id, from, to) {
            Some(request) => {
                info!(request_id = %request_id, status = %request.status, "timer advanced delivery");
            }
            None => {
                debug!(request_id = %request_id, "timer fired for a stale request; ignoring");
            }
        }
    });

    let mut armed = timers.entry(request_id).or_default();
    if let Some(previous) = armed.transition.replace(handle) {
        previous.abort();
    }
}

fn arm_eta_ticker(state: &Arc<AppState>, timers: &DashMap<Uuid, ArmedTimers>, request_id: Uuid) {
    let state = state.clone();
    let period = state.config.eta_tick();
    let handle = tokio::spawn(async move {
        let mut tick = interval(period);
        tick.tick().await;
        loop {
            tick.tick().await;
            if state.store.tick_eta(request_id).is_none() {
                break;
            }
        }
    });

    let mut armed = timers.entry(request_id).or_default();
    if let Some(previous) = armed.eta.replace(handle) {
        previous.abort();
    }
}
