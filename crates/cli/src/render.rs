//! Table rendering.

use std::io;

use rusty_money::{Money, iso};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

use livetable::{
    live_table::FeedStatus,
    products::models::{PriceEntry, Product},
};

const NO_PRICE: &str = "No price available";

/// Latest price cell, e.g. `$10.00 (from 2024-01-01)`.
pub(crate) fn price_cell(latest: Option<&PriceEntry>) -> String {
    match latest {
        Some(entry) => format!(
            "{} (from {})",
            Money::from_decimal(entry.price, iso::USD),
            entry.valid_date
        ),
        None => NO_PRICE.to_string(),
    }
}

/// Write the product table followed by a feed status line.
pub(crate) fn write_table(
    mut out: impl io::Write,
    rows: &[Product],
    status: &FeedStatus,
) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Product Name", "Category", "Latest Price"]);

    for product in rows {
        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.category.clone(),
            price_cell(product.latest_price()),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::first(), Alignment::right());

    writeln!(out, "{table}")?;

    match status {
        FeedStatus::Connecting => writeln!(out, "connecting to live updates..."),
        FeedStatus::Live => writeln!(out, "{} products, live", rows.len()),
        FeedStatus::Unavailable(reason) => {
            writeln!(out, "live updates unavailable: {reason}")
        }
    }
}
