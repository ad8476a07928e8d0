pub mod aggregate;
pub mod config;
pub mod duration;
pub mod error;
pub mod ingest;
pub mod io;
pub mod money;
pub mod paths;
pub mod rates;
pub mod request;
pub mod roles;
pub mod session;
pub mod timeline;
pub mod types;

pub use error::{EstimateError, Result};
