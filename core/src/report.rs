use asnscope_common::event::Event;
use tokio::sync::mpsc;

pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Sending half of the status event stream.
///
/// Sends never block and never fail loudly: a front end that stopped
/// listening does not affect the run.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: mpsc::UnboundedSender<Event>,
}

impl Reporter {
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    pub fn log(&self, text: impl Into<String>) {
        self.send(Event::log(text));
    }

    pub fn progress(&self, completed: usize, total: usize) {
        self.send(Event::Progress { completed, total });
    }

    pub fn prefix_counter(&self, processed: usize, total: usize) {
        self.send(Event::PrefixCounter { processed, total });
    }
}
