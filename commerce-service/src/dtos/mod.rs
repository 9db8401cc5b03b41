//! Request and response DTOs for the HTTP surface.

pub mod documents;

pub use documents::{
    CreateDocumentRequest, DocumentResponse, DocumentSummaryResponse, FromSourceRequest,
    LineItemRequest, LineItemResponse, ListQuery, PaymentUpdateRequest, StatusUpdateRequest,
    UpdateDocumentRequest,
};
