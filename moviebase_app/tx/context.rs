use std::{fmt, sync::Arc, time::Duration};

use tokio::time::Instant;

use super::SharedTransaction;

enum Value {
    Transaction(SharedTransaction),
    Deadline(Instant),
}

struct Node {
    parent: Option<Arc<Node>>,
    value: Value,
}

/// Immutable request-scoped context.
///
/// Deriving a context never changes the one it was derived from, so sibling
/// chains built on the same parent never see each other's values.
#[derive(Clone, Default)]
pub struct TxContext {
    head: Option<Arc<Node>>,
}

impl TxContext {
    /// Empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    fn derive(&self, value: Value) -> Self {
        Self {
            head: Some(Arc::new(Node {
                parent: self.head.clone(),
                value,
            })),
        }
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.head.as_deref(), |node| node.parent.as_deref())
    }

    pub fn attach(&self, tx: SharedTransaction) -> Self {
        self.derive(Value::Transaction(tx))
    }

    pub fn transaction(&self) -> Option<&SharedTransaction> {
        self.nodes().find_map(|node| match &node.value {
            Value::Transaction(tx) => Some(tx),
            Value::Deadline(_) => None,
        })
    }

    /// Derives a context that expires at `deadline`, or at the parent's
    /// deadline if that comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline() {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        self.derive(Value::Deadline(deadline))
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.nodes().find_map(|node| match node.value {
            Value::Deadline(deadline) => Some(deadline),
            Value::Transaction(_) => None,
        })
    }
}

impl fmt::Debug for TxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxContext")
            .field("transaction", &self.transaction().is_some())
            .field("deadline", &self.deadline())
            .finish()
    }
}
