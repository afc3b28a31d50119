pub mod delivery;
pub mod drone;
pub mod location;
pub mod user;
