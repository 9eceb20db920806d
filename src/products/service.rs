//! Products service.

use async_trait::async_trait;
use futures::{StreamExt, future, stream::BoxStream};
use mockall::automock;
use serde::{Deserialize, de::IgnoredAny};
use serde_json::Value;

use crate::{
    config::ClientConfig,
    products::{
        data::{ConfirmedDelete, NewProduct, ProductChanges},
        documents,
        errors::MutationError,
        models::{ProductId, Snapshot},
    },
    transport::{FeedError, TransportRouter},
};

/// Live sequence of full product snapshots.
///
/// Every [`FeedError`] is terminal, including a snapshot that fails to
/// decode: the feed yields it and then ends.
pub type ProductFeed = BoxStream<'static, Result<Snapshot, FeedError>>;

/// Products gateway backed by the GraphQL transport router.
#[derive(Debug, Clone)]
pub struct GraphQlProductsService {
    router: TransportRouter,
}

impl GraphQlProductsService {
    /// Service over an existing router.
    #[must_use]
    pub fn new(router: TransportRouter) -> Self {
        Self { router }
    }

    /// Build the service over the default HTTP and WebSocket channels.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(TransportRouter::from_config(config))
    }
}

#[async_trait]
impl ProductsService for GraphQlProductsService {
    fn watch_products(&self) -> ProductFeed {
        self.router
            .subscribe(documents::watch_products())
            .map(|item| item.and_then(decode_snapshot))
            .scan(false, |failed, item| {
                if *failed {
                    return future::ready(None);
                }

                *failed = item.is_err();

                future::ready(Some(item))
            })
            .boxed()
    }

    #[tracing::instrument(name = "products.create", skip(self, product), err)]
    async fn create_product(&self, product: NewProduct) -> Result<ProductId, MutationError> {
        let data = self
            .router
            .execute(documents::insert_product(&product))
            .await?;

        let payload: InsertProductOne = serde_json::from_value(data)?;

        let created = payload
            .insert_product_one
            .ok_or(MutationError::MissingResult("insert_product_one"))?
            .id;

        tracing::info!(product_id = %created, "created product");

        Ok(created)
    }

    #[tracing::instrument(
        name = "products.update",
        skip(self, changes),
        fields(product_id = %product, new_price = changes.price.is_some()),
        err
    )]
    async fn update_product(
        &self,
        product: ProductId,
        changes: ProductChanges,
    ) -> Result<ProductId, MutationError> {
        let data = self
            .router
            .execute(documents::update_product(product, &changes))
            .await?;

        let payload: UpdateProductByPk = serde_json::from_value(data)?;

        let updated = payload
            .update_product_by_pk
            .ok_or(MutationError::NotFound(product))?
            .id;

        // Only priced once the row is known to exist.
        if let Some(price) = &changes.price {
            let data = self
                .router
                .execute(documents::add_product_price(updated, price))
                .await?;

            let payload: InsertProductPricesOne = serde_json::from_value(data)?;

            payload
                .insert_product_prices_one
                .ok_or(MutationError::MissingResult("insert_product_prices_one"))?;

            tracing::debug!(product_id = %updated, "appended price");
        }

        tracing::info!(product_id = %updated, "updated product");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "products.delete",
        skip(self, product),
        fields(product_id = %product.product()),
        err
    )]
    async fn delete_product(&self, product: ConfirmedDelete) -> Result<ProductId, MutationError> {
        let data = self
            .router
            .execute(documents::delete_product(product))
            .await?;

        let payload: DeleteProductByPk = serde_json::from_value(data)?;

        let deleted = payload
            .delete_product_by_pk
            .ok_or(MutationError::NotFound(product.product()))?
            .id;

        tracing::info!(product_id = %deleted, "deleted product");

        Ok(deleted)
    }
}

/// Backend operations on the product collection.
#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Opens the live product feed.
    fn watch_products(&self) -> ProductFeed;

    /// Creates a product with its first dated price.
    async fn create_product(&self, product: NewProduct) -> Result<ProductId, MutationError>;

    /// Updates a product's fields, appending a price when one is given.
    async fn update_product(
        &self,
        product: ProductId,
        changes: ProductChanges,
    ) -> Result<ProductId, MutationError>;

    /// Deletes a product the user has confirmed.
    async fn delete_product(&self, product: ConfirmedDelete) -> Result<ProductId, MutationError>;
}

#[derive(Debug, Deserialize)]
struct Returning {
    id: ProductId,
}

#[derive(Debug, Deserialize)]
struct InsertProductOne {
    insert_product_one: Option<Returning>,
}

#[derive(Debug, Deserialize)]
struct UpdateProductByPk {
    update_product_by_pk: Option<Returning>,
}

#[derive(Debug, Deserialize)]
struct InsertProductPricesOne {
    insert_product_prices_one: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct DeleteProductByPk {
    delete_product_by_pk: Option<Returning>,
}

fn decode_snapshot(data: Value) -> Result<Snapshot, FeedError> {
    serde_json::from_value(data).map_err(FeedError::Decode)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::stream;
    use jiff::civil::date;
    use rust_decimal::Decimal;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        products::{data::DeleteRequest, models::PriceEntry},
        transport::{
            GraphQlError, MockRequestChannel, MockStreamingChannel, OperationKind, RequestError,
        },
    };

    use super::*;

    fn make_service(request: MockRequestChannel, streaming: MockStreamingChannel) -> GraphQlProductsService {
        GraphQlProductsService::new(TransportRouter::new(Arc::new(request), Arc::new(streaming)))
    }

    fn idle_streaming() -> MockStreamingChannel {
        let mut streaming = MockStreamingChannel::new();

        streaming.expect_subscribe().never();

        streaming
    }

    #[tokio::test]
    async fn create_product_returns_new_id() -> TestResult {
        let mut request = MockRequestChannel::new();

        request
            .expect_execute()
            .once()
            .withf(|operation| {
                operation.kind == OperationKind::Mutation && operation.name == "AddProduct"
            })
            .return_once(|_| Ok(json!({ "insert_product_one": { "id": 42 } })));

        let service = make_service(request, idle_streaming());

        let created = service
            .create_product(NewProduct {
                name: "Widget".to_string(),
                category: "Tools".to_string(),
                price: PriceEntry::new(Decimal::from(10), date(2024, 1, 1)),
            })
            .await?;

        assert_eq!(created, ProductId::new(42));

        Ok(())
    }

    #[tokio::test]
    async fn update_null_result_is_not_found() {
        let mut request = MockRequestChannel::new();

        request
            .expect_execute()
            .once()
            .withf(|operation| operation.variables.get("id") == Some(&json!(99)))
            .return_once(|_| Ok(json!({ "update_product_by_pk": null })));

        let service = make_service(request, idle_streaming());

        let result = service
            .update_product(
                ProductId::new(99),
                ProductChanges {
                    name: "Widget".to_string(),
                    category: "Parts".to_string(),
                    price: None,
                },
            )
            .await;

        assert!(
            matches!(result, Err(MutationError::NotFound(id)) if id == ProductId::new(99)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn missing_product_gets_no_price_row() {
        let mut request = MockRequestChannel::new();

        request
            .expect_execute()
            .times(1)
            .withf(|operation| operation.name == "UpdateProduct")
            .return_once(|_| Ok(json!({ "update_product_by_pk": null })));

        let service = make_service(request, idle_streaming());

        let result = service
            .update_product(
                ProductId::new(99),
                ProductChanges {
                    name: "Widget".to_string(),
                    category: "Parts".to_string(),
                    price: Some(PriceEntry::new(Decimal::from(12), date(2024, 2, 1))),
                },
            )
            .await;

        assert!(
            matches!(result, Err(MutationError::NotFound(id)) if id == ProductId::new(99)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn price_is_added_after_the_update() -> TestResult {
        let mut request = MockRequestChannel::new();
        let mut sequence = mockall::Sequence::new();

        request
            .expect_execute()
            .once()
            .in_sequence(&mut sequence)
            .withf(|operation| operation.name == "UpdateProduct")
            .return_once(|_| Ok(json!({ "update_product_by_pk": { "id": 3 } })));

        request
            .expect_execute()
            .once()
            .in_sequence(&mut sequence)
            .withf(|operation| {
                operation.name == "AddProductPrice"
                    && operation.variables.pointer("/price/product_id") == Some(&json!(3))
            })
            .return_once(|_| Ok(json!({ "insert_product_prices_one": { "product_id": 3 } })));

        let service = make_service(request, idle_streaming());

        let updated = service
            .update_product(
                ProductId::new(3),
                ProductChanges {
                    name: "Widget".to_string(),
                    category: "Tools".to_string(),
                    price: Some(PriceEntry::new(Decimal::from(12), date(2024, 2, 1))),
                },
            )
            .await?;

        assert_eq!(updated, ProductId::new(3));

        Ok(())
    }

    #[tokio::test]
    async fn delete_returns_deleted_id() -> TestResult {
        let mut request = MockRequestChannel::new();

        request
            .expect_execute()
            .once()
            .withf(|operation| operation.name == "DeleteProduct")
            .return_once(|_| Ok(json!({ "delete_product_by_pk": { "id": 5 } })));

        let service = make_service(request, idle_streaming());

        let deleted = service
            .delete_product(DeleteRequest::new(ProductId::new(5)).confirm())
            .await?;

        assert_eq!(deleted, ProductId::new(5));

        Ok(())
    }

    #[tokio::test]
    async fn delete_server_rejection_propagates() {
        let mut request = MockRequestChannel::new();

        request.expect_execute().once().return_once(|_| {
            Err(RequestError::Rejected {
                operation: "DeleteProduct",
                errors: vec![GraphQlError::new("permission denied")],
            })
        });

        let service = make_service(request, idle_streaming());

        let result = service
            .delete_product(DeleteRequest::new(ProductId::new(5)).confirm())
            .await;

        assert!(
            matches!(result, Err(MutationError::Request(RequestError::Rejected { .. }))),
            "expected Rejected, got {result:?}"
        );
    }

    #[tokio::test]
    async fn watch_products_decodes_snapshots() -> TestResult {
        let mut request = MockRequestChannel::new();

        request.expect_execute().never();

        let mut streaming = MockStreamingChannel::new();

        streaming
            .expect_subscribe()
            .once()
            .withf(|operation| operation.kind == OperationKind::Subscription)
            .return_once(|_| {
                stream::iter(vec![Ok(json!({
                    "product": [{
                        "id": 1,
                        "product_name": "Widget",
                        "product_category": "Tools",
                        "product_prices": [{ "price": 10, "valid_date": "2024-01-01" }]
                    }]
                }))])
                .boxed()
            });

        let service = make_service(request, streaming);

        let items: Vec<_> = service.watch_products().collect().await;

        assert_eq!(items.len(), 1);

        let Some(Ok(snapshot)) = items.into_iter().next() else {
            return Err("expected one decoded snapshot".into());
        };

        assert_eq!(snapshot.products.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn watch_products_surfaces_decode_failures() {
        let mut request = MockRequestChannel::new();

        request.expect_execute().never();

        let mut streaming = MockStreamingChannel::new();

        streaming
            .expect_subscribe()
            .once()
            .return_once(|_| stream::iter(vec![Ok(json!({ "product": "nope" }))]).boxed());

        let service = make_service(request, streaming);

        let items: Vec<_> = service.watch_products().collect().await;

        assert!(
            matches!(items.as_slice(), [Err(FeedError::Decode(_))]),
            "expected a decode failure, got {items:?}"
        );
    }

    #[tokio::test]
    async fn watch_products_ends_after_a_decode_failure() {
        let mut request = MockRequestChannel::new();

        request.expect_execute().never();

        let mut streaming = MockStreamingChannel::new();

        streaming.expect_subscribe().once().return_once(|_| {
            stream::iter(vec![
                Ok(json!({ "product": "nope" })),
                Ok(json!({ "product": [] })),
            ])
            .boxed()
        });

        let service = make_service(request, streaming);

        let items: Vec<_> = service.watch_products().collect().await;

        assert!(
            matches!(items.as_slice(), [Err(FeedError::Decode(_))]),
            "expected the feed to stop at the decode failure, got {items:?}"
        );
    }
}
