//! Edit Session state machine.

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::{
    observers::{Observer, ObserverId, Observers},
    products::{
        data::{NewProduct, ProductChanges},
        errors::MutationError,
        models::{PriceEntry, Product, ProductId},
    },
    session::draft::{Draft, DraftField, FieldName, ValidationError, validate},
    transport::FailureKind,
};

/// What an open session will do when submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// Submitting creates a new product.
    Creating,
    /// Submitting updates the given product.
    Editing(ProductId),
}

impl Display for SessionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Creating => f.write_str("creating"),
            Self::Editing(id) => write!(f, "editing {id}"),
        }
    }
}

/// The error surfaced to the user after a failed submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFailure {
    /// Required fields were missing.
    Validation(ValidationError),
    /// The backend refused or could not be reached.
    Mutation {
        /// Where the failure came from.
        kind: FailureKind,
        /// Message shown to the user.
        message: String,
    },
}

impl Display for SessionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Validation(error) => Display::fmt(error, f),
            Self::Mutation { message, .. } => f.write_str(message),
        }
    }
}

/// Identifies one submission. A resolution carrying a ticket the session
/// is no longer waiting for is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionTicket(u64);

/// Backend call a submit turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Insert a new product with its first price.
    Create(NewProduct),
    /// Update an existing row.
    Update {
        /// Row being edited.
        product: ProductId,
        /// Full set of editable fields, plus a price when it changed.
        changes: ProductChanges,
    },
}

/// A submission handed to the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    /// Pass back to [`EditSession::resolve`] with the outcome.
    pub ticket: SubmissionTicket,
    /// What to send.
    pub submission: Submission,
}

/// Open session contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    mode: SessionMode,
    draft: Draft,
    seed_price: Option<PriceEntry>,
    failure: Option<SessionFailure>,
    in_flight: Option<SubmissionTicket>,
}

impl OpenSession {
    fn new(mode: SessionMode, draft: Draft, seed_price: Option<PriceEntry>) -> Self {
        Self {
            mode,
            draft,
            seed_price,
            failure: None,
            in_flight: None,
        }
    }

    /// Create or edit.
    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Current field values.
    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Error from the last submit, if it failed.
    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    /// Whether a submission is awaiting its result.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Whether a form is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No form is showing.
    #[default]
    Closed,
    /// A create or edit form is showing.
    Open(OpenSession),
}

/// Events emitted by [`EditSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A form opened.
    Opened(SessionMode),
    /// A field was set or cleared.
    DraftChanged(Draft),
    /// A valid draft was handed off for sending.
    Submitting(SessionMode),
    /// Validation or the backend rejected the submit.
    Failed(SessionFailure),
    /// The form closed, by success or cancel.
    Closed,
}

/// How a submission result was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The backend accepted the submission and the session closed.
    Submitted {
        /// Mode the session was in.
        mode: SessionMode,
        /// Id the backend returned.
        product: ProductId,
    },

    /// The backend refused it. The session stays open with its draft.
    Failed(SessionFailure),

    /// The session was cancelled, re-opened or closed in the meantime.
    Discarded,
}

/// Intents the session cannot accept in its current state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No form is open.
    #[error("no edit session is open")]
    NotOpen,

    /// Another form is already open.
    #[error("an edit session is already open ({0})")]
    AlreadyOpen(SessionMode),

    /// The previous submit has not resolved yet.
    #[error("a submission is already in flight")]
    SubmissionPending,

    /// The draft is missing required fields.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A single create-or-edit form interaction.
#[derive(Debug, Default)]
pub struct EditSession {
    state: SessionState,
    next_ticket: u64,
    observers: Observers<SessionEvent>,
}

impl EditSession {
    /// Closed session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Mode of the open form.
    #[must_use]
    pub fn mode(&self) -> Option<SessionMode> {
        self.open().map(OpenSession::mode)
    }

    /// Draft of the open form.
    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.open().map(OpenSession::draft)
    }

    /// Error from the last failed submit of the open form.
    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.open().and_then(OpenSession::failure)
    }

    /// Whether a form is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    /// Open an empty draft for a new product.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyOpen`] when a session is open.
    pub fn open_for_create(&mut self) -> Result<(), SessionError> {
        self.open_with(OpenSession::new(SessionMode::Creating, Draft::default(), None))
    }

    /// Open a draft seeded from `product` and its latest price.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyOpen`] when a session is open.
    pub fn open_for_edit(&mut self, product: &Product) -> Result<(), SessionError> {
        self.open_with(OpenSession::new(
            SessionMode::Editing(product.id),
            Draft::from_product(product),
            product.latest_price().cloned(),
        ))
    }

    /// # Errors
    ///
    /// Returns [`SessionError::NotOpen`] when no session is open.
    pub fn set_field(&mut self, value: DraftField) -> Result<(), SessionError> {
        self.edit_draft(|draft| draft.set(value))
    }

    /// # Errors
    ///
    /// Returns [`SessionError::NotOpen`] when no session is open.
    pub fn clear_field(&mut self, field: FieldName) -> Result<(), SessionError> {
        self.edit_draft(|draft| draft.clear(field))
    }

    /// Discard the draft. A submission still in flight will be discarded
    /// when it resolves.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotOpen`] when no session is open.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        let SessionState::Open(open) = std::mem::take(&mut self.state) else {
            return Err(SessionError::NotOpen);
        };

        tracing::debug!(mode = %open.mode, "edit session cancelled");

        self.observers.notify(&SessionEvent::Closed);

        Ok(())
    }

    /// Validate the draft and hand out the backend call to make.
    ///
    /// The session stays open until [`resolve`](Self::resolve) is called
    /// with the returned ticket.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] when required fields are missing,
    /// recording the failure on the session. Returns
    /// [`SessionError::SubmissionPending`] while an earlier submission is
    /// unresolved.
    pub fn submit(&mut self) -> Result<PendingSubmission, SessionError> {
        let SessionState::Open(open) = &mut self.state else {
            return Err(SessionError::NotOpen);
        };

        if open.in_flight.is_some() {
            return Err(SessionError::SubmissionPending);
        }

        let validated = match validate(&open.draft) {
            Ok(validated) => validated,
            Err(error) => {
                let failure = SessionFailure::Validation(error.clone());

                open.failure = Some(failure.clone());

                self.observers.notify(&SessionEvent::Failed(failure));

                return Err(error.into());
            }
        };

        let submission = match open.mode {
            SessionMode::Creating => Submission::Create(validated.into()),
            SessionMode::Editing(product) => Submission::Update {
                product,
                changes: validated.into_changes(open.seed_price.as_ref()),
            },
        };

        let ticket = SubmissionTicket(self.next_ticket);

        self.next_ticket = self.next_ticket.wrapping_add(1);

        open.in_flight = Some(ticket);
        open.failure = None;

        let mode = open.mode;

        tracing::debug!(%mode, "edit session submitting");

        self.observers.notify(&SessionEvent::Submitting(mode));

        Ok(PendingSubmission { ticket, submission })
    }

    /// Apply the backend's answer to a submission.
    ///
    /// Success closes the session. Failure keeps the mode and draft and
    /// records the error. Answers to tickets the session is no longer
    /// waiting on are discarded.
    pub fn resolve(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<ProductId, MutationError>,
    ) -> Resolution {
        let SessionState::Open(open) = &mut self.state else {
            return Resolution::Discarded;
        };

        if open.in_flight != Some(ticket) {
            return Resolution::Discarded;
        }

        open.in_flight = None;

        match outcome {
            Ok(product) => {
                let mode = open.mode;

                self.state = SessionState::Closed;
                self.observers.notify(&SessionEvent::Closed);

                Resolution::Submitted { mode, product }
            }
            Err(error) => {
                let failure = SessionFailure::Mutation {
                    kind: error.kind(),
                    message: error.to_string(),
                };

                tracing::warn!(mode = %open.mode, %error, "submission failed");

                open.failure = Some(failure.clone());

                self.observers
                    .notify(&SessionEvent::Failed(failure.clone()));

                Resolution::Failed(failure)
            }
        }
    }

    /// Register an observer for session events.
    pub fn observe(&mut self, observer: impl Observer<SessionEvent> + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Returns whether the observer was registered.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn open(&self) -> Option<&OpenSession> {
        match &self.state {
            SessionState::Open(open) => Some(open),
            SessionState::Closed => None,
        }
    }

    fn open_with(&mut self, session: OpenSession) -> Result<(), SessionError> {
        if let SessionState::Open(open) = &self.state {
            return Err(SessionError::AlreadyOpen(open.mode));
        }

        let mode = session.mode;

        self.state = SessionState::Open(session);

        tracing::debug!(%mode, "edit session opened");

        self.observers.notify(&SessionEvent::Opened(mode));

        Ok(())
    }

    fn edit_draft(&mut self, edit: impl FnOnce(&mut Draft)) -> Result<(), SessionError> {
        let SessionState::Open(open) = &mut self.state else {
            return Err(SessionError::NotOpen);
        };

        edit(&mut open.draft);

        let draft = open.draft.clone();

        self.observers.notify(&SessionEvent::DraftChanged(draft));

        Ok(())
    }
}
