//! Products Data

use serde_json::{Value, json};

use crate::products::models::{PriceEntry, ProductId};

/// New Product Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Product name.
    pub name: String,
    /// Product category.
    pub category: String,
    /// Opening entry of the price history.
    pub price: PriceEntry,
}

impl NewProduct {
    /// `product_insert_input` with the first price nested under `product_prices`.
    pub(crate) fn to_insert_input(&self) -> Value {
        json!({
            "product_name": self.name,
            "product_category": self.category,
            "product_prices": {
                "data": [self.price],
            },
        })
    }
}

/// Product Update Data
///
/// `price` is only set when the edit introduced a new dated price. It is
/// appended to the price history once the update has found the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChanges {
    /// Product name.
    pub name: String,
    /// Product category.
    pub category: String,
    /// New dated price, if the edit introduced one.
    pub price: Option<PriceEntry>,
}

impl ProductChanges {
    /// `product_set_input` for the scalar columns.
    pub(crate) fn to_set_input(&self) -> Value {
        json!({
            "product_name": self.name,
            "product_category": self.category,
        })
    }
}

/// A delete the user asked for but has not confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRequest {
    product: ProductId,
}

impl DeleteRequest {
    /// Ask to delete `product`.
    #[must_use]
    pub const fn new(product: ProductId) -> Self {
        Self { product }
    }

    /// Product to delete.
    #[must_use]
    pub const fn product(&self) -> ProductId {
        self.product
    }

    /// Record the user's explicit confirmation.
    #[must_use]
    pub const fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete {
            product: self.product,
        }
    }
}

/// A delete the user has confirmed. Only obtainable through
/// [`DeleteRequest::confirm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedDelete {
    product: ProductId,
}

impl ConfirmedDelete {
    /// Product to delete.
    #[must_use]
    pub const fn product(&self) -> ProductId {
        self.product
    }
}
