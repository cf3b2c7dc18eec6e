//! Shared console state: busy flag and notification history

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::notifier::NotificationRecord;

/// State readable by other tasks while a table is waiting on the network
#[derive(Debug)]
pub struct ConsoleState {
    /// True while a request is outstanding; action buttons should be disabled
    pub busy: bool,
    pub history: VecDeque<NotificationRecord>,
    pub history_max_size: usize,
}

impl ConsoleState {
    pub fn new(history_max_size: usize) -> Self {
        Self {
            busy: false,
            history: VecDeque::with_capacity(history_max_size),
            history_max_size,
        }
    }

    /// Add a notification to history
    pub fn add_notification(&mut self, record: NotificationRecord) {
        if self.history_max_size == 0 {
            return;
        }
        if self.history.len() >= self.history_max_size {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    pub fn last_notification(&self) -> Option<&NotificationRecord> {
        self.history.back()
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<ConsoleState>>;

pub fn new_state_handle(history_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(ConsoleState::new(history_max_size)))
}
