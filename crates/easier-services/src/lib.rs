//! easier-services
//!
//! The service's features as typed async calls: document upload and
//! question answering, image description, topic summaries, synthetic
//! users and token usage.

pub mod documents;
pub mod error;
pub mod images;
mod request;
pub mod topics;
pub mod usage;
pub mod users;
