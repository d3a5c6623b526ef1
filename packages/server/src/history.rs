//! Bounded in-memory message history served by `READ`.

use std::collections::VecDeque;

use tokio::sync::Mutex;

/// FIFO of recent message texts; the oldest entry is evicted once full.
pub struct HistoryBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<String>>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn append(&self, text: String) {
        let mut entries = self.entries.lock().await;
        entries.push_back(text);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Point-in-time copy, oldest first.
    pub async fn snapshot(&self) -> Vec<String> {
        let entries = self.entries.lock().await;
        entries.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
