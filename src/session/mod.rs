//! Edit Session
//!
//! Local state for one in-progress create or edit form.

pub mod draft;
pub mod edit;

pub use draft::{Draft, DraftField, FieldName, ValidatedDraft, ValidationError, validate};
pub use edit::*;
