//! Form drafts.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::civil::Date;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use thiserror::Error;

use crate::products::{
    data::{NewProduct, ProductChanges},
    models::{PriceEntry, Product},
};

/// Logical form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    /// Product name.
    Name,
    /// Product category.
    Category,
    /// Price amount.
    Price,
    /// Date the price applies from.
    ValidDate,
}

impl FieldName {
    /// Every field, in form order.
    pub const ALL: [Self; 4] = [Self::Name, Self::Category, Self::Price, Self::ValidDate];
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Price => "price",
            Self::ValidDate => "valid_date",
        })
    }
}

/// A single field value entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    /// Product name.
    Name(String),
    /// Product category.
    Category(String),
    /// Price amount.
    Price(Decimal),
    /// Date the price applies from.
    ValidDate(Date),
}

impl DraftField {
    /// Which field this value fills.
    #[must_use]
    pub const fn field(&self) -> FieldName {
        match self {
            Self::Name(_) => FieldName::Name,
            Self::Category(_) => FieldName::Category,
            Self::Price(_) => FieldName::Price,
            Self::ValidDate(_) => FieldName::ValidDate,
        }
    }
}

/// Pending form values. Every field is optional until validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Product name.
    pub name: Option<String>,
    /// Product category.
    pub category: Option<String>,
    /// Price amount.
    pub price: Option<Decimal>,
    /// Date the price applies from.
    pub valid_date: Option<Date>,
}

impl Draft {
    /// Copy a product's current fields and its latest price.
    ///
    /// The draft does not follow later changes to the product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        let latest = product.latest_price();

        Self {
            name: Some(product.name.clone()),
            category: Some(product.category.clone()),
            price: latest.map(|entry| entry.price),
            valid_date: latest.map(|entry| entry.valid_date),
        }
    }

    /// Overwrite the field `value` belongs to.
    pub fn set(&mut self, value: DraftField) {
        match value {
            DraftField::Name(name) => self.name = Some(name),
            DraftField::Category(category) => self.category = Some(category),
            DraftField::Price(price) => self.price = Some(price),
            DraftField::ValidDate(valid_date) => self.valid_date = Some(valid_date),
        }
    }

    /// Blank one field.
    pub fn clear(&mut self, field: FieldName) {
        match field {
            FieldName::Name => self.name = None,
            FieldName::Category => self.category = None,
            FieldName::Price => self.price = None,
            FieldName::ValidDate => self.valid_date = None,
        }
    }
}

/// A draft with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Trimmed, non-empty category.
    pub category: String,
    /// Dated price from the form.
    pub price: PriceEntry,
}

impl ValidatedDraft {
    /// Changes for an existing product.
    ///
    /// The price is only included when it differs from `seed`, the latest
    /// price the draft was opened with, so an untouched price does not grow
    /// the product's price history.
    #[must_use]
    pub fn into_changes(self, seed: Option<&PriceEntry>) -> ProductChanges {
        let price = (seed != Some(&self.price)).then_some(self.price);

        ProductChanges {
            name: self.name,
            category: self.category,
            price,
        }
    }
}

impl From<ValidatedDraft> for NewProduct {
    fn from(draft: ValidatedDraft) -> Self {
        Self {
            name: draft.name,
            category: draft.category,
            price: draft.price,
        }
    }
}

/// Fields that must be filled in before the draft can be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", join_fields(missing))]
pub struct ValidationError {
    /// Missing fields, in form order.
    pub missing: SmallVec<[FieldName; 4]>,
}

/// Check that every required field is present.
///
/// Blank text counts as missing.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming every missing field.
pub fn validate(draft: &Draft) -> Result<ValidatedDraft, ValidationError> {
    let name = draft.name.as_deref().filter(|name| !name.trim().is_empty());
    let category = draft
        .category
        .as_deref()
        .filter(|category| !category.trim().is_empty());

    match (name, category, draft.price, draft.valid_date) {
        (Some(name), Some(category), Some(price), Some(valid_date)) => Ok(ValidatedDraft {
            name: name.to_string(),
            category: category.to_string(),
            price: PriceEntry::new(price, valid_date),
        }),
        (name, category, price, valid_date) => {
            let present = [
                name.is_some(),
                category.is_some(),
                price.is_some(),
                valid_date.is_some(),
            ];

            let missing = FieldName::ALL
                .into_iter()
                .zip(present)
                .filter_map(|(field, present)| (!present).then_some(field))
                .collect();

            Err(ValidationError { missing })
        }
    }
}

fn join_fields(fields: &[FieldName]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
