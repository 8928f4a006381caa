//! Session domain module.
//!
//! - `message`: Conversation message types (`MessageRole`, `Message`)
//! - `turn`: Per-turn execution record (`TurnRecord`)

mod message;
mod turn;

pub use message::{Message, MessageRole};
pub use turn::TurnRecord;
