pub mod analyze;
pub mod events;
pub mod rates;
pub mod roles;
pub mod session;
