//! Session lifecycle and UI reconciliation.
//!
//! - `store`: `SessionStore`, owner of history, traces and the world handle
//! - `draw_sync`: `DrawSync`, idempotent draw-report propagation

mod draw_sync;
mod store;

pub use draw_sync::DrawSync;
pub use store::SessionStore;
