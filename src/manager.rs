//! Product manager.
//!
//! Owns the live table and the edit session and drives both from one task:
//! feed items, user intents and mutation results are handled one at a time
//! in a single `select!` loop, so neither piece of state needs a lock.

use std::sync::Arc;

use futures::{
    FutureExt, StreamExt,
    future::{self, BoxFuture},
    stream::FuturesUnordered,
};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    live_table::LiveTable,
    observers::{Observer, ObserverId, Observers},
    products::{
        ProductFeed, ProductsService,
        data::{ConfirmedDelete, DeleteRequest},
        errors::MutationError,
        models::{ProductId, Snapshot},
    },
    session::{
        DraftField, EditSession, FieldName, Resolution, SessionError, SessionMode, Submission,
        SubmissionTicket,
    },
    transport::{FailureKind, FeedError},
};

/// User intents, as emitted by the table and form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Open an empty create form.
    Add,
    /// Open the edit form seeded from a row.
    Edit(ProductId),
    /// Set one field of the open draft.
    SetField(DraftField),
    /// Blank one field of the open draft.
    ClearField(FieldName),
    /// Validate and send the open draft.
    Submit,
    /// Close the form, discarding the draft.
    Cancel,
    /// Ask for confirmation before deleting a row.
    RequestDelete(ProductId),
    /// Send the pending delete.
    ConfirmDelete,
    /// Drop the pending delete without sending it.
    DismissDelete,
    /// Stop the run loop.
    Shutdown,
}

/// Outcomes the table and session do not report themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A create mutation succeeded.
    Created(ProductId),
    /// An update mutation succeeded.
    Updated(ProductId),
    /// A delete mutation succeeded. The row goes when the feed drops it.
    Deleted(ProductId),
    /// A delete mutation failed. The row stays.
    DeleteFailed {
        /// Product the user asked to delete.
        product: ProductId,
        /// Where the failure came from.
        kind: FailureKind,
        /// Message shown to the user.
        message: String,
    },
    /// A delete is waiting for the user to confirm.
    DeleteAwaitingConfirmation(ProductId),
    /// An intent could not be applied in the current state.
    IntentRejected(String),
}

/// Reasons an intent is rejected before anything is sent.
#[derive(Debug, Error)]
pub enum IntentError {
    /// The id is not in the current snapshot.
    #[error("product {0} is not in the table")]
    UnknownProduct(ProductId),

    /// The edit session refused the intent.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Confirm or dismiss without a requested delete.
    #[error("no delete is awaiting confirmation")]
    NoPendingDelete,
}

/// Whether the run loop should keep going after an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep handling intents.
    Continue,
    /// Leave the run loop.
    Shutdown,
}

enum Completion {
    Submission {
        ticket: SubmissionTicket,
        outcome: Result<ProductId, MutationError>,
    },
    Delete {
        product: ProductId,
        outcome: Result<ProductId, MutationError>,
    },
}

/// Drives the live table and edit session against a products service.
pub struct ProductManager {
    service: Arc<dyn ProductsService>,
    table: LiveTable,
    session: EditSession,
    pending_delete: Option<DeleteRequest>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    notices: Observers<Notice>,
}

impl ProductManager {
    /// Manager with an empty table and a closed session.
    #[must_use]
    pub fn new(service: Arc<dyn ProductsService>) -> Self {
        Self {
            service,
            table: LiveTable::new(),
            session: EditSession::new(),
            pending_delete: None,
            in_flight: FuturesUnordered::new(),
            notices: Observers::new(),
        }
    }

    /// The live table.
    #[must_use]
    pub fn table(&self) -> &LiveTable {
        &self.table
    }

    /// Mutable access, mainly for registering observers.
    pub fn table_mut(&mut self) -> &mut LiveTable {
        &mut self.table
    }

    /// The edit session.
    #[must_use]
    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Mutable access, mainly for registering observers.
    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Delete waiting for confirmation, if any.
    #[must_use]
    pub fn pending_delete(&self) -> Option<DeleteRequest> {
        self.pending_delete
    }

    /// Number of mutations sent and not yet resolved.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Register an observer for [`Notice`]s.
    pub fn observe_notices(&mut self, observer: impl Observer<Notice> + 'static) -> ObserverId {
        self.notices.subscribe(observer)
    }

    /// Returns whether the observer was registered.
    pub fn unobserve_notices(&mut self, id: ObserverId) -> bool {
        self.notices.unsubscribe(id)
    }

    /// Open the live feed.
    #[must_use]
    pub fn watch(&self) -> ProductFeed {
        self.service.watch_products()
    }

    /// Apply one feed item to the table.
    pub fn apply_feed(&mut self, item: Result<Snapshot, FeedError>) {
        self.table.apply(item);
    }

    /// Handle one user intent.
    ///
    /// Mutations are started here and resolved later by the run loop or
    /// [`settle`](Self::settle).
    ///
    /// # Errors
    ///
    /// Returns an [`IntentError`] when the intent does not fit the current
    /// state. Nothing is sent in that case.
    pub fn handle(&mut self, intent: Intent) -> Result<Control, IntentError> {
        match intent {
            Intent::Add => self.session.open_for_create()?,
            Intent::Edit(id) => {
                let product = self.table.find(id).ok_or(IntentError::UnknownProduct(id))?;

                self.session.open_for_edit(product)?;
            }
            Intent::SetField(value) => self.session.set_field(value)?,
            Intent::ClearField(field) => self.session.clear_field(field)?,
            Intent::Submit => {
                let pending = self.session.submit()?;

                self.send(pending.ticket, pending.submission);
            }
            Intent::Cancel => self.session.cancel()?,
            Intent::RequestDelete(id) => {
                if self.table.find(id).is_none() {
                    return Err(IntentError::UnknownProduct(id));
                }

                self.pending_delete = Some(DeleteRequest::new(id));
                self.notices.notify(&Notice::DeleteAwaitingConfirmation(id));
            }
            Intent::ConfirmDelete => {
                let request = self
                    .pending_delete
                    .take()
                    .ok_or(IntentError::NoPendingDelete)?;

                self.send_delete(request.confirm());
            }
            Intent::DismissDelete => {
                self.pending_delete
                    .take()
                    .ok_or(IntentError::NoPendingDelete)?;
            }
            Intent::Shutdown => return Ok(Control::Shutdown),
        }

        Ok(Control::Continue)
    }

    /// Wait for every in-flight mutation and apply its result.
    pub async fn settle(&mut self) {
        while let Some(completion) = self.in_flight.next().await {
            self.complete(completion);
        }
    }

    /// Drive the table and session until shutdown.
    ///
    /// Ends on [`Intent::Shutdown`] or when every intent sender is gone.
    /// The feed is dropped on exit, closing its connection, and results of
    /// mutations still in flight are discarded.
    pub async fn run(&mut self, mut intents: mpsc::Receiver<Intent>) {
        let mut feed = Some(self.service.watch_products());

        loop {
            tokio::select! {
                item = next_feed_item(&mut feed) => match item {
                    Some(item) => self.table.apply(item),
                    None => {
                        feed = None;
                        self.table.feed_ended();
                    }
                },
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(completion);
                }
                intent = intents.recv() => {
                    let Some(intent) = intent else {
                        break;
                    };

                    match self.handle(intent) {
                        Ok(Control::Continue) => {}
                        Ok(Control::Shutdown) => break,
                        Err(error) => {
                            tracing::warn!(%error, "intent rejected");

                            self.notices.notify(&Notice::IntentRejected(error.to_string()));
                        }
                    }
                }
            }
        }

        drop(feed);

        let discarded = self.in_flight.len();

        self.in_flight.clear();

        tracing::debug!(discarded, "product manager stopped");
    }

    fn send(&mut self, ticket: SubmissionTicket, submission: Submission) {
        let service = Arc::clone(&self.service);

        let call = async move {
            let outcome = match submission {
                Submission::Create(product) => service.create_product(product).await,
                Submission::Update { product, changes } => {
                    service.update_product(product, changes).await
                }
            };

            Completion::Submission { ticket, outcome }
        };

        self.in_flight.push(call.boxed());
    }

    fn send_delete(&mut self, confirmed: ConfirmedDelete) {
        let service = Arc::clone(&self.service);
        let product = confirmed.product();

        let call = async move {
            let outcome = service.delete_product(confirmed).await;

            Completion::Delete { product, outcome }
        };

        self.in_flight.push(call.boxed());
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Submission { ticket, outcome } => {
                match self.session.resolve(ticket, outcome) {
                    Resolution::Submitted {
                        mode: SessionMode::Creating,
                        product,
                    } => self.notices.notify(&Notice::Created(product)),
                    Resolution::Submitted {
                        mode: SessionMode::Editing(_),
                        product,
                    } => self.notices.notify(&Notice::Updated(product)),
                    Resolution::Failed(_) => {}
                    Resolution::Discarded => {
                        tracing::debug!("discarded result for a closed edit session");
                    }
                }
            }
            Completion::Delete { product, outcome } => match outcome {
                Ok(deleted) => self.notices.notify(&Notice::Deleted(deleted)),
                Err(error) => {
                    tracing::warn!(product_id = %product, %error, "delete failed");

                    self.notices.notify(&Notice::DeleteFailed {
                        product,
                        kind: error.kind(),
                        message: error.to_string(),
                    });
                }
            },
        }
    }
}

impl std::fmt::Debug for ProductManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductManager")
            .field("table", &self.table)
            .field("session", &self.session)
            .field("pending_delete", &self.pending_delete)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

async fn next_feed_item(feed: &mut Option<ProductFeed>) -> Option<Result<Snapshot, FeedError>> {
    match feed {
        Some(feed) => feed.next().await,
        None => future::pending().await,
    }
}
