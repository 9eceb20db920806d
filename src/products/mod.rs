//! Products

pub mod data;
mod documents;
pub mod errors;
pub mod models;
pub mod service;

pub use errors::MutationError;
pub use service::*;
