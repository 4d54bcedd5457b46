//! In-memory message history owned by the access point worker.
//!
//! [`Feed`] has no concurrency awareness of its own. It is only ever touched
//! from the single worker task spawned by [`crate::access_point`], which is
//! what makes its plain `&mut self` methods safe to share.

/// Ordered, append-only sequence of messages.
///
/// Insertion order is significant, duplicates are kept and nothing is ever
/// evicted.
#[derive(Debug, Default)]
pub struct Feed {
    messages: Vec<String>,
}

impl Feed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Appends a message to the end of the feed.
    pub fn append(&mut self, message: String) {
        self.messages.push(message);
    }

    /// Returns the most recent `count` messages, oldest first.
    ///
    /// Asking for more than the feed holds returns everything; asking for
    /// zero returns an empty vector.
    pub fn snapshot(&self, count: usize) -> Vec<String> {
        let start = self.messages.len().saturating_sub(count);
        self.messages[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
