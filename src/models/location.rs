use serde::{Deserialize, Serialize};

/// A point the drone flies to or from. Coordinates may be zero when the
/// address has not been geocoded; only the address is required for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl Location {
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            lat: 0.0,
            lng: 0.0,
            address: address.into(),
        }
    }
}
