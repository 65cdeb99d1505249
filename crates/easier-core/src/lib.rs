//! easier-core
//!
//! Pure domain types for the "AI Made Easier" client: usage records and
//! their aggregation, response shapes of the backend service, chat history
//! and request progress. No HTTP dependency lives here.

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod progress;
