//! `watch` command

use std::{io, sync::Arc};

use tokio::{signal, sync::mpsc};

use livetable::{
    live_table::{FeedStatus, TableEvent},
    manager::{Intent, ProductManager},
    observers::Observer,
    products::{ProductsService, models::Product},
};

use crate::render;

use super::CommandError;

/// Re-render the table on every snapshot until interrupted or until live
/// updates become unavailable.
pub(crate) async fn run(service: Arc<dyn ProductsService>) -> Result<(), CommandError> {
    let mut manager = ProductManager::new(service);

    let (intents, receiver) = mpsc::channel(8);

    manager.table_mut().observe(TableView::new(intents));

    tokio::select! {
        () = manager.run(receiver) => {}
        result = signal::ctrl_c() => {
            result.map_err(CommandError::Signal)?;

            tracing::info!("ctrl_c signal received");
        }
    }

    match manager.table().status() {
        FeedStatus::Unavailable(reason) => {
            Err(CommandError::LiveUpdatesUnavailable(reason.clone()))
        }
        FeedStatus::Connecting | FeedStatus::Live => Ok(()),
    }
}

/// Keeps the last rows and status and renders them to stdout.
struct TableView {
    rows: Arc<[Product]>,
    status: FeedStatus,
    stop: mpsc::Sender<Intent>,
}

impl TableView {
    fn new(stop: mpsc::Sender<Intent>) -> Self {
        Self {
            rows: Arc::from(Vec::new()),
            status: FeedStatus::Connecting,
            stop,
        }
    }

    fn render(&self) {
        if let Err(error) = render::write_table(io::stdout().lock(), &self.rows, &self.status) {
            tracing::warn!(%error, "failed to render table");
        }
    }
}

impl Observer<TableEvent> for TableView {
    fn notify(&mut self, event: &TableEvent) {
        match event {
            TableEvent::Replaced(rows) => {
                self.rows = Arc::clone(rows);
                self.status = FeedStatus::Live;
                self.render();
            }
            TableEvent::StatusChanged(FeedStatus::Unavailable(reason)) => {
                self.status = FeedStatus::Unavailable(reason.clone());
                self.render();

                if let Err(error) = self.stop.try_send(Intent::Shutdown) {
                    tracing::debug!(%error, "could not stop product manager");
                }
            }
            TableEvent::StatusChanged(FeedStatus::Connecting | FeedStatus::Live) => {}
        }
    }
}
