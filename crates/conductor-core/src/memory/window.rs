//! Bounded conversation window
//!
//! Fixed-capacity FIFO log of the most recent messages. Purely in-memory and
//! owned by exactly one agent.

use std::collections::VecDeque;

use crate::types::ChatMessage;

pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Most recent messages, oldest first
#[derive(Debug, Clone)]
pub struct ConversationWindow {
    capacity: usize,
    messages: VecDeque<ChatMessage>,
    total_appended: u64,
}

impl Default for ConversationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl ConversationWindow {
    /// Create a window holding at most `capacity` messages (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
            total_appended: 0,
        }
    }

    /// Append a message, evicting from the front while over capacity
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        self.total_appended += 1;
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Append several messages in order
    pub fn extend(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        for message in messages {
            self.append(message);
        }
    }

    /// Current contents in order
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages appended over the window's lifetime, evicted ones included
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
