//! Livetable prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    config::{AdminSecret, ClientConfig, ReconnectPolicy},
    live_table::{FeedStatus, LiveTable, TableEvent},
    manager::{Control, Intent, IntentError, Notice, ProductManager},
    observers::{Observer, ObserverId},
    products::{
        GraphQlProductsService, MutationError, ProductFeed, ProductsService,
        data::{ConfirmedDelete, DeleteRequest, NewProduct, ProductChanges},
        models::{PriceEntry, Product, ProductId, Snapshot, latest_price},
    },
    session::{
        Draft, DraftField, EditSession, FieldName, Resolution, SessionError, SessionEvent,
        SessionFailure, SessionMode, SessionState, ValidationError, validate,
    },
    transport::{
        FailureKind, FeedError, HttpChannel, Operation, OperationKind, RequestChannel,
        RequestError, Route, StreamingChannel, TransportRouter, WsChannel,
    },
};
