pub mod driver;
pub mod transitions;
