//! Integration tests for create and edit sessions submitted through the
//! request/response channel

use std::sync::Arc;

use jiff::civil::date;
use rust_decimal::Decimal;
use serde_json::json;
use testresult::TestResult;

use livetable::{
    manager::{Intent, IntentError, ProductManager},
    products::{
        GraphQlProductsService,
        models::{PriceEntry, Product, ProductId, Snapshot},
    },
    session::{DraftField, FieldName, SessionError, SessionFailure, SessionMode, SessionState},
    transport::{FailureKind, MockRequestChannel, MockStreamingChannel, RequestError, TransportRouter},
};

fn product(id: i64, name: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: "Parts".to_string(),
        prices: vec![PriceEntry::new(Decimal::from(10), date(2024, 1, 1))],
    }
}

fn manager_with(request: MockRequestChannel) -> ProductManager {
    let mut streaming = MockStreamingChannel::new();

    streaming.expect_subscribe().never();

    ProductManager::new(Arc::new(GraphQlProductsService::new(TransportRouter::new(
        Arc::new(request),
        Arc::new(streaming),
    ))))
}

#[tokio::test]
async fn edit_of_vanished_product_keeps_session_open() -> TestResult {
    let mut request = MockRequestChannel::new();

    request
        .expect_execute()
        .once()
        .withf(|operation| operation.name == "UpdateProduct")
        .return_once(|_| Ok(json!({ "update_product_by_pk": null })));

    let mut manager = manager_with(request);

    manager.apply_feed(Ok(Snapshot::new(vec![product(1, "Widget"), product(99, "Doomed")])));
    manager.handle(Intent::Edit(ProductId::new(99)))?;
    manager.handle(Intent::SetField(DraftField::Name("Renamed".to_string())))?;

    // Someone else deletes the product while the form is open.
    manager.apply_feed(Ok(Snapshot::new(vec![product(1, "Widget")])));

    manager.handle(Intent::Submit)?;
    manager.settle().await;

    let session = manager.session();

    assert_eq!(session.mode(), Some(SessionMode::Editing(ProductId::new(99))));
    assert_eq!(
        session.draft().and_then(|draft| draft.name.as_deref()),
        Some("Renamed")
    );
    assert_eq!(
        session.failure(),
        Some(&SessionFailure::Mutation {
            kind: FailureKind::Server,
            message: "product 99 not found".to_string(),
        })
    );
    assert!(manager.table().find(ProductId::new(99)).is_none());

    Ok(())
}

#[tokio::test]
async fn new_price_is_appended_after_the_update() -> TestResult {
    let mut request = MockRequestChannel::new();
    let mut sequence = mockall::Sequence::new();

    request
        .expect_execute()
        .once()
        .in_sequence(&mut sequence)
        .withf(|operation| {
            operation.name == "UpdateProduct"
                && operation.variables
                    == json!({
                        "id": 1,
                        "changes": { "product_name": "Widget", "product_category": "Parts" }
                    })
        })
        .return_once(|_| Ok(json!({ "update_product_by_pk": { "id": 1 } })));

    request
        .expect_execute()
        .once()
        .in_sequence(&mut sequence)
        .withf(|operation| {
            operation.name == "AddProductPrice"
                && operation.variables
                    == json!({
                        "price": { "product_id": 1, "price": "12", "valid_date": "2024-02-01" }
                    })
        })
        .return_once(|_| Ok(json!({ "insert_product_prices_one": { "product_id": 1 } })));

    let mut manager = manager_with(request);

    manager.apply_feed(Ok(Snapshot::new(vec![product(1, "Widget")])));
    manager.handle(Intent::Edit(ProductId::new(1)))?;
    manager.handle(Intent::SetField(DraftField::Price(Decimal::from(12))))?;
    manager.handle(Intent::SetField(DraftField::ValidDate(date(2024, 2, 1))))?;
    manager.handle(Intent::Submit)?;
    manager.settle().await;

    assert_eq!(manager.session().state(), &SessionState::Closed);

    // The table only changes when the feed says so.
    assert_eq!(
        manager
            .table()
            .find(ProductId::new(1))
            .map(|widget| widget.prices.len()),
        Some(1)
    );

    Ok(())
}

#[tokio::test]
async fn unchanged_price_is_not_sent_again() -> TestResult {
    let mut request = MockRequestChannel::new();

    request
        .expect_execute()
        .once()
        .withf(|operation| {
            operation.name == "UpdateProduct"
                && operation.variables
                    == json!({
                        "id": 1,
                        "changes": { "product_name": "Sprocket", "product_category": "Parts" }
                    })
        })
        .return_once(|_| Ok(json!({ "update_product_by_pk": { "id": 1 } })));

    let mut manager = manager_with(request);

    manager.apply_feed(Ok(Snapshot::new(vec![product(1, "Widget")])));
    manager.handle(Intent::Edit(ProductId::new(1)))?;
    manager.handle(Intent::SetField(DraftField::Name("Sprocket".to_string())))?;
    manager.handle(Intent::Submit)?;
    manager.settle().await;

    assert!(!manager.session().is_open());

    Ok(())
}

#[tokio::test]
async fn incomplete_create_sends_nothing() -> TestResult {
    let mut request = MockRequestChannel::new();

    request.expect_execute().never();

    let mut manager = manager_with(request);

    manager.handle(Intent::Add)?;
    manager.handle(Intent::SetField(DraftField::Name("Widget".to_string())))?;
    manager.handle(Intent::SetField(DraftField::Category("  ".to_string())))?;

    let result = manager.handle(Intent::Submit);

    let Err(IntentError::Session(SessionError::Invalid(error))) = result else {
        return Err(format!("expected a validation failure, got {result:?}").into());
    };

    assert_eq!(
        error.missing.as_slice(),
        &[FieldName::Category, FieldName::Price, FieldName::ValidDate]
    );
    assert_eq!(manager.session().mode(), Some(SessionMode::Creating));
    assert_eq!(manager.in_flight(), 0);

    Ok(())
}

#[tokio::test]
async fn rejected_create_can_be_corrected_and_resubmitted() -> TestResult {
    let mut request = MockRequestChannel::new();
    let mut attempts = 0;

    request
        .expect_execute()
        .times(2)
        .withf(|operation| operation.name == "AddProduct")
        .returning(move |_| {
            attempts += 1;

            if attempts == 1 {
                Err(RequestError::Status {
                    status: 503,
                    body: "service unavailable".to_string(),
                })
            } else {
                Ok(json!({ "insert_product_one": { "id": 7 } }))
            }
        });

    let mut manager = manager_with(request);

    manager.handle(Intent::Add)?;

    for value in [
        DraftField::Name("Widget".to_string()),
        DraftField::Category("Parts".to_string()),
        DraftField::Price(Decimal::new(1299, 2)),
        DraftField::ValidDate(date(2024, 3, 1)),
    ] {
        manager.handle(Intent::SetField(value))?;
    }

    manager.handle(Intent::Submit)?;
    manager.settle().await;

    assert!(
        matches!(
            manager.session().failure(),
            Some(SessionFailure::Mutation {
                kind: FailureKind::Server,
                ..
            })
        ),
        "expected a server failure, got {:?}",
        manager.session().failure()
    );
    assert_eq!(
        manager.session().draft().and_then(|draft| draft.price),
        Some(Decimal::new(1299, 2))
    );

    manager.handle(Intent::Submit)?;
    manager.settle().await;

    assert!(!manager.session().is_open());

    Ok(())
}
