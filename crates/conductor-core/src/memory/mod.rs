//! Conversation memory

mod window;

pub use window::{ConversationWindow, DEFAULT_WINDOW_SIZE};
