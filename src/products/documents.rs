//! Products GraphQL documents

use serde_json::json;

use crate::{
    products::{
        data::{ConfirmedDelete, NewProduct, ProductChanges},
        models::{PriceEntry, ProductId},
    },
    transport::Operation,
};

const WATCH_PRODUCTS_GQL: &str = include_str!("graphql/watch_products.graphql");
const INSERT_PRODUCT_GQL: &str = include_str!("graphql/insert_product.graphql");
const UPDATE_PRODUCT_GQL: &str = include_str!("graphql/update_product.graphql");
const ADD_PRODUCT_PRICE_GQL: &str = include_str!("graphql/add_product_price.graphql");
const DELETE_PRODUCT_GQL: &str = include_str!("graphql/delete_product.graphql");

pub(crate) fn watch_products() -> Operation {
    Operation::subscription("WatchProducts", WATCH_PRODUCTS_GQL)
}

pub(crate) fn insert_product(product: &NewProduct) -> Operation {
    Operation::mutation("AddProduct", INSERT_PRODUCT_GQL)
        .with_variables(json!({ "product": product.to_insert_input() }))
}

pub(crate) fn update_product(product: ProductId, changes: &ProductChanges) -> Operation {
    Operation::mutation("UpdateProduct", UPDATE_PRODUCT_GQL).with_variables(json!({
        "id": product,
        "changes": changes.to_set_input(),
    }))
}

/// Appends a dated price to an existing product's history.
pub(crate) fn add_product_price(product: ProductId, price: &PriceEntry) -> Operation {
    Operation::mutation("AddProductPrice", ADD_PRODUCT_PRICE_GQL).with_variables(json!({
        "price": {
            "product_id": product,
            "price": price.price,
            "valid_date": price.valid_date,
        },
    }))
}

pub(crate) fn delete_product(product: ConfirmedDelete) -> Operation {
    Operation::mutation("DeleteProduct", DELETE_PRODUCT_GQL)
        .with_variables(json!({ "id": product.product() }))
}
