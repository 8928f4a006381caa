//! Application layer for the map agent.
//!
//! Coordinates the domain model, diagnostic capture and turn dispatch into a
//! single session lifecycle.

pub mod session;

pub use session::{DrawSync, SessionStore};
