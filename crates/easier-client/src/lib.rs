//! easier-client
//!
//! HTTP access to the "AI Made Easier" service: the shared client, login and
//! registration, the explicit [`session::Session`] context every
//! authenticated call takes, and its on-disk store.

pub mod client;
pub mod error;
pub mod flows;
pub mod jwt;
pub mod session;
pub mod store;
