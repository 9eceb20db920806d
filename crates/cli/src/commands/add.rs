//! `add` command

use std::{io::Write, sync::Arc};

use clap::Args;
use jiff::civil::Date;
use rust_decimal::Decimal;

use livetable::{
    manager::{Intent, ProductManager},
    products::{ProductsService, models::ProductId},
    session::DraftField,
};

use super::{CommandError, collect_notices, submitted_product};

/// Arguments for `add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Product name
    #[arg(long)]
    pub name: String,

    /// Product category
    #[arg(long)]
    pub category: String,

    /// First price, e.g. 12.99
    #[arg(long)]
    pub price: Decimal,

    /// Date the price applies from (YYYY-MM-DD)
    #[arg(long)]
    pub valid_date: Date,
}

impl AddArgs {
    fn into_fields(self) -> [DraftField; 4] {
        [
            DraftField::Name(self.name),
            DraftField::Category(self.category),
            DraftField::Price(self.price),
            DraftField::ValidDate(self.valid_date),
        ]
    }
}

pub(crate) async fn run(service: Arc<dyn ProductsService>, args: AddArgs) -> Result<(), CommandError> {
    let created = submit(service, args).await?;

    writeln!(std::io::stdout(), "created product {created}")?;

    Ok(())
}

/// Fill a create session with `args`, submit it and wait for the result.
pub(crate) async fn submit(
    service: Arc<dyn ProductsService>,
    args: AddArgs,
) -> Result<ProductId, CommandError> {
    let mut manager = ProductManager::new(service);
    let notices = collect_notices(&mut manager);

    manager.handle(Intent::Add)?;

    for value in args.into_fields() {
        manager.handle(Intent::SetField(value))?;
    }

    manager.handle(Intent::Submit)?;
    manager.settle().await;

    submitted_product(&manager, &notices)
}
