//! Backing store abstraction and the in-memory implementation.
//!
//! A search compiles into a [`QueryPlan`]; anything implementing
//! [`BackingStore`] can execute it. Every call carries a
//! [`CancellationToken`] that long-running stores must honour.

mod error;
mod memory;
mod plan;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use plan::{AggregateItem, JoinSpec, OrderItem, PageWindow, ProjectionItem, QueryPlan};

use crate::access::ResultRow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Executes query plans
pub trait BackingStore: Send + Sync {
    /// Run the plan and return its rows keyed by projection alias
    fn fetch(&self, plan: &QueryPlan, cancel: &CancellationToken) -> StoreResult<Vec<ResultRow>>;

    /// Count the root rows matching the plan's joins and predicate.
    ///
    /// Projection, grouping, ordering and paging are ignored.
    fn count(&self, plan: &QueryPlan, cancel: &CancellationToken) -> StoreResult<u64>;
}

/// Shared flag used to abandon a running search
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with `StoreError::Cancelled` once cancellation was requested
    pub fn check(&self) -> StoreResult<()> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}
