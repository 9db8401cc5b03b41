//! Data models for commerce-service.

pub mod document;
pub mod line_item;
pub mod master;

pub use document::{
    Document, DocumentFilter, HeaderPatch, NewDocument, PaymentUpdate, StatusChange,
};
pub use line_item::{DocumentLine, NewLine};
pub use master::{CounterpartyRecord, LocationRecord};
