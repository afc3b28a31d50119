use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    /// Simulated drone approach time before the parcel can be picked up.
    pub arrival_delay_ms: u64,
    /// Simulated flight time from pickup confirmation to delivery.
    pub flight_delay_ms: u64,
    /// Period of the advisory ETA countdown, one minute per tick.
    pub eta_tick_ms: u64,
    /// Artificial latency of the stubbed auth backend.
    pub auth_latency_ms: u64,
    /// Artificial latency of the stubbed dispatch backend.
    pub request_latency_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            arrival_delay_ms: parse_or_default("ARRIVAL_DELAY_MS", 5_000)?,
            flight_delay_ms: parse_or_default("FLIGHT_DELAY_MS", 8_000)?,
            eta_tick_ms: parse_or_default("ETA_TICK_MS", 60_000)?,
            auth_latency_ms: parse_or_default("AUTH_LATENCY_MS", 1_000)?,
            request_latency_ms: parse_or_default("REQUEST_LATENCY_MS", 1_500)?,
        })
    }

    pub fn arrival_delay(&self) -> Duration {
        Duration::from_millis(self.arrival_delay_ms)
    }

    pub fn flight_delay(&self) -> Duration {
        Duration::from_millis(self.flight_delay_ms)
    }

    pub fn eta_tick(&self) -> Duration {
        Duration::from_millis(self.eta_tick_ms)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
