//! CLI commands

use std::{io, sync::Arc, sync::mpsc as std_mpsc};

use clap::Subcommand;
use thiserror::Error;

use livetable::{
    manager::{IntentError, Notice, ProductManager},
    products::{MutationError, ProductsService, models::ProductId},
    session::SessionFailure,
    transport::FeedError,
};

pub(crate) mod add;
pub(crate) mod delete;
pub(crate) mod edit;
pub(crate) mod watch;

/// Commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the product table and keep it updated until interrupted
    Watch,

    /// Create a product with its first price
    Add(add::AddArgs),

    /// Edit a product; a changed price is added to its price history
    Edit(edit::EditArgs),

    /// Delete a product
    Delete(delete::DeleteArgs),
}

/// Command failures.
#[derive(Debug, Error)]
pub(crate) enum CommandError {
    #[error(transparent)]
    Intent(#[from] IntentError),

    #[error("submission failed: {0}")]
    Submission(SessionFailure),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("the backend did not report a result")]
    NoResult,

    #[error("live feed ended before the first snapshot")]
    FeedEnded,

    #[error("live updates unavailable: {0}")]
    LiveUpdatesUnavailable(String),

    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[source] io::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Run a command against the products service.
pub(crate) async fn run(
    command: Command,
    service: Arc<dyn ProductsService>,
) -> Result<(), CommandError> {
    match command {
        Command::Watch => watch::run(service).await,
        Command::Add(args) => add::run(service, args).await,
        Command::Edit(args) => edit::run(service, args).await,
        Command::Delete(args) => delete::run(service.as_ref(), args, io::stdin().lock()).await,
    }
}

/// Forward manager notices to a channel the command can drain afterwards.
fn collect_notices(manager: &mut ProductManager) -> std_mpsc::Receiver<Notice> {
    let (tx, rx) = std_mpsc::channel();

    manager.observe_notices(move |notice: &Notice| {
        if tx.send(notice.clone()).is_err() {
            tracing::debug!("notice receiver dropped");
        }
    });

    rx
}

/// Product id reported by a settled create or edit.
fn submitted_product(
    manager: &ProductManager,
    notices: &std_mpsc::Receiver<Notice>,
) -> Result<ProductId, CommandError> {
    if let Some(failure) = manager.session().failure() {
        return Err(CommandError::Submission(failure.clone()));
    }

    notices
        .try_iter()
        .find_map(|notice| match notice {
            Notice::Created(id) | Notice::Updated(id) => Some(id),
            _ => None,
        })
        .ok_or(CommandError::NoResult)
}
