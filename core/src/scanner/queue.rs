use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::task::Task;

/// Unbounded FIFO shared by every worker.
///
/// Pushing never blocks. Popping waits for a bounded time so callers can
/// re-check their stop condition between waits.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
    notify: Notify,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: Task) {
        self.tasks.lock().push_back(task);
        self.notify.notify_one();
    }

    pub fn extend(&self, tasks: impl IntoIterator<Item = Task>) {
        let added = {
            let mut queue = self.tasks.lock();
            let before = queue.len();
            queue.extend(tasks);
            queue.len() - before
        };

        for _ in 0..added {
            self.notify.notify_one();
        }
    }

    /// Takes the oldest task, waiting up to `wait` for one to arrive.
    pub async fn pop(&self, wait: Duration) -> Option<Task> {
        let deadline = Instant::now() + wait;

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before looking, so a push in between is not missed.
            notified.as_mut().enable();

            let next = self.tasks.lock().pop_front();
            if next.is_some() {
                return next;
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }

    /// Drops every queued task and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut queue = self.tasks.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}
