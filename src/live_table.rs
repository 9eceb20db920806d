//! Live Table State
//!
//! The in-memory projection of the product collection. Rows only ever come
//! from the live feed and every snapshot replaces them wholesale.

use std::sync::Arc;

use crate::{
    observers::{Observer, ObserverId, Observers},
    products::models::{PriceEntry, Product, ProductId, Snapshot},
    transport::FeedError,
};

/// Health of the live feed as shown next to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Waiting for the first snapshot.
    Connecting,

    /// At least one snapshot has arrived and the feed is still running.
    Live,

    /// The feed has ended. The rows shown are the last ones received.
    Unavailable(String),
}

/// Events emitted by [`LiveTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// Rows were replaced by a snapshot.
    Replaced(Arc<[Product]>),
    /// The feed status changed.
    StatusChanged(FeedStatus),
}

/// Rows of the latest snapshot plus the feed status.
#[derive(Debug)]
pub struct LiveTable {
    rows: Arc<[Product]>,
    status: FeedStatus,
    observers: Observers<TableEvent>,
}

impl LiveTable {
    /// Empty table waiting for the first snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Arc::from(Vec::new()),
            status: FeedStatus::Connecting,
            observers: Observers::new(),
        }
    }

    /// Replace every row with the snapshot's products, in feed order.
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.rows = Arc::from(snapshot.products);

        tracing::debug!(rows = self.rows.len(), "table replaced");

        self.observers
            .notify(&TableEvent::Replaced(Arc::clone(&self.rows)));
    }

    /// Apply one item from the live feed.
    ///
    /// A feed error marks the table unavailable and keeps the last rows.
    pub fn apply(&mut self, item: Result<Snapshot, FeedError>) {
        match item {
            Ok(snapshot) => {
                self.replace(snapshot);
                self.set_status(FeedStatus::Live);
            }
            Err(error) => {
                tracing::warn!(%error, "live updates unavailable");

                self.set_status(FeedStatus::Unavailable(error.to_string()));
            }
        }
    }

    /// Mark the table unavailable because the feed ended without an error.
    pub fn feed_ended(&mut self) {
        if !matches!(self.status, FeedStatus::Unavailable(_)) {
            self.set_status(FeedStatus::Unavailable("live feed ended".to_string()));
        }
    }

    /// Rows in the order the feed delivered them.
    #[must_use]
    pub fn current_view(&self) -> &[Product] {
        &self.rows
    }

    /// Shared handle to the current rows.
    #[must_use]
    pub fn rows(&self) -> Arc<[Product]> {
        Arc::clone(&self.rows)
    }

    /// Row with the given id, if the last snapshot had it.
    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.rows.iter().find(|product| product.id == id)
    }

    /// Computed on every call, never cached.
    #[must_use]
    pub fn latest_price_of<'p>(&self, product: &'p Product) -> Option<&'p PriceEntry> {
        product.latest_price()
    }

    /// Current feed status.
    #[must_use]
    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    /// Register an observer for table events.
    pub fn observe(&mut self, observer: impl Observer<TableEvent> + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Returns whether the observer was registered.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn set_status(&mut self, status: FeedStatus) {
        if self.status == status {
            return;
        }

        self.status = status;

        self.observers
            .notify(&TableEvent::StatusChanged(self.status.clone()));
    }
}

impl Default for LiveTable {
    fn default() -> Self {
        Self::new()
    }
}
