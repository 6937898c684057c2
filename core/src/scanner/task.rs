use std::sync::Arc;

use asnscope_common::network::target::Target;

/// One unit of work on the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Look up the prefixes a target announces and fan them out.
    ExpandTarget { target: Arc<Target> },
    /// Look up the host records of one prefix owned by a target.
    ScanPrefix { owner: Arc<Target>, prefix: String },
}

impl Task {
    pub fn expand(target: Arc<Target>) -> Self {
        Self::ExpandTarget { target }
    }

    pub fn scan(owner: Arc<Target>, prefix: impl Into<String>) -> Self {
        Self::ScanPrefix {
            owner,
            prefix: prefix.into(),
        }
    }

    /// Key of the target this task is accounted against.
    pub fn owner_key(&self) -> &str {
        match self {
            Self::ExpandTarget { target } => target.key(),
            Self::ScanPrefix { owner, .. } => owner.key(),
        }
    }
}
