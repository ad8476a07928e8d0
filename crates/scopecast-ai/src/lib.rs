//! `scopecast-ai` holds the one asynchronous step in scopecast, asking a hosted
//! text-generation model for a structured project estimate.
//!
//! ```text
//! AnalyzeRequest + Roster
//!     │  prompt::system_instruction / user_instruction
//!     ▼
//! EstimatorClient::generate   ← POST {endpoint}/v1beta/models/{model}:generateContent
//!     │                          responseMimeType = application/json
//!     │                          responseSchema   = schema::estimate_schema()
//!     ▼
//! EstimateDocument            ← parse_document (fence-tolerant)
//!     │  EstimatorClient::estimate
//!     ▼
//! Ingested                    ← scopecast_core::ingest
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use scopecast_ai::EstimatorClient;
//!
//! let client = EstimatorClient::from_config(&config)?;
//! let ingested = client.estimate(&request, &config).await?;
//! ```

pub mod client;
pub mod error;
pub mod prompt;
pub mod schema;

pub use client::{extract_json, parse_document, EstimatorClient, Generated, Usage};
pub use error::AiError;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AiError>;
