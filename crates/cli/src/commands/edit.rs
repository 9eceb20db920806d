//! `edit` command

use std::{io::Write, sync::Arc};

use clap::Args;
use futures::StreamExt;
use jiff::civil::Date;
use rust_decimal::Decimal;

use livetable::{
    manager::{Intent, ProductManager},
    products::{ProductsService, models::ProductId},
    session::DraftField,
};

use super::{CommandError, collect_notices, submitted_product};

/// Arguments for `edit`. Fields left out keep their current values.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Product id
    pub id: i64,

    /// New product name
    #[arg(long)]
    pub name: Option<String>,

    /// New product category
    #[arg(long)]
    pub category: Option<String>,

    /// New price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Date the new price applies from (YYYY-MM-DD)
    #[arg(long)]
    pub valid_date: Option<Date>,
}

impl EditArgs {
    fn overrides(self) -> impl Iterator<Item = DraftField> {
        [
            self.name.map(DraftField::Name),
            self.category.map(DraftField::Category),
            self.price.map(DraftField::Price),
            self.valid_date.map(DraftField::ValidDate),
        ]
        .into_iter()
        .flatten()
    }
}

pub(crate) async fn run(
    service: Arc<dyn ProductsService>,
    args: EditArgs,
) -> Result<(), CommandError> {
    let updated = submit(service, args).await?;

    writeln!(std::io::stdout(), "updated product {updated}")?;

    Ok(())
}

/// Seed an edit session from the first snapshot, apply the overrides and
/// submit.
pub(crate) async fn submit(
    service: Arc<dyn ProductsService>,
    args: EditArgs,
) -> Result<ProductId, CommandError> {
    let mut manager = ProductManager::new(service);
    let notices = collect_notices(&mut manager);

    let snapshot = {
        let mut feed = manager.watch();

        feed.next().await.ok_or(CommandError::FeedEnded)??
    };

    manager.apply_feed(Ok(snapshot));

    manager.handle(Intent::Edit(ProductId::new(args.id)))?;

    for value in args.overrides() {
        manager.handle(Intent::SetField(value))?;
    }

    manager.handle(Intent::Submit)?;
    manager.settle().await;

    submitted_product(&manager, &notices)
}
