//! Kind-generic handler bodies shared by the four per-type modules.

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::domain::status::DocumentKind;
use crate::dtos::{
    CreateDocumentRequest, DocumentResponse, DocumentSummaryResponse, FromSourceRequest,
    ListQuery, PaymentUpdateRequest, StatusUpdateRequest, UpdateDocumentRequest,
};
use crate::middleware::TenantContext;
use crate::services::metrics::ERRORS_TOTAL;
use crate::startup::AppState;

/// Count the error by taxonomy bucket before it leaves the handler.
fn track_error(err: AppError) -> AppError {
    let error_type = match &err {
        AppError::Validation(_) => "validation",
        AppError::UnknownReference(_) => "unknown_reference",
        AppError::BusinessRule(_) => "business_rule",
        AppError::InvalidTransition { .. } => "invalid_transition",
        AppError::BadRequest(_) => "bad_request",
        AppError::NotFound(_) => "not_found",
        AppError::AuthError(_) => "auth",
        AppError::Conflict(_) => "conflict",
        AppError::DatabaseError(_) => "database",
        AppError::ConfigError(_) => "config",
        AppError::InternalError(_) => "internal",
    };
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
    err
}

pub(super) async fn create(
    state: AppState,
    kind: DocumentKind,
    tenant: TenantContext,
    payload: CreateDocumentRequest,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let (document, lines) = state
        .documents
        .create(tenant.tenant_id, kind, &payload, None)
        .await.map_err(track_error)?;
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_parts(document, lines)),
    ))
}

pub(super) async fn create_from_source(
    state: AppState,
    kind: DocumentKind,
    tenant: TenantContext,
    payload: FromSourceRequest,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let (document, lines) = state
        .documents
        .create_from_source(tenant.tenant_id, kind, &payload)
        .await.map_err(track_error)?;
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_parts(document, lines)),
    ))
}

pub(super) async fn list(
    state: AppState,
    kind: DocumentKind,
    tenant: TenantContext,
    query: ListQuery,
) -> Result<Json<Vec<DocumentSummaryResponse>>, AppError> {
    let documents = state.documents.list(tenant.tenant_id, kind, &query).await.map_err(track_error)?;
    Ok(Json(
        documents
            .into_iter()
            .map(DocumentSummaryResponse::from)
            .collect(),
    ))
}

pub(super) async fn get(
    state: AppState,
    kind: DocumentKind,
    tenant: TenantContext,
    human_id: String,
) -> Result<Json<DocumentResponse>, AppError> {
    let (document, lines) = state.documents.get(tenant.tenant_id, kind, &human_id).await.map_err(track_error)?;
    Ok(Json(DocumentResponse::from_parts(document, lines)))
}

pub(super) async fn update(
    state: AppState,
    kind: DocumentKind,
    tenant: TenantContext,
    human_id: String,
    payload: UpdateDocumentRequest,
) -> Result<Json<DocumentResponse>, AppError> {
    let (document, lines) = state
        .documents
        .update(tenant.tenant_id, kind, &human_id, &payload)
        .await.map_err(track_error)?;
    Ok(Json(DocumentResponse::from_parts(document, lines)))
}

pub(super) async fn update_status(
    state: AppState,
    kind: DocumentKind,
    tenant: TenantContext,
    human_id: String,
    payload: StatusUpdateRequest,
) -> Result<Json<DocumentResponse>, AppError> {
    let (document, lines) = state
        .documents
        .update_status(tenant.tenant_id, kind, &human_id, &payload)
        .await.map_err(track_error)?;
    Ok(Json(DocumentResponse::from_parts(document, lines)))
}

pub(super) async fn update_payment(
    state: AppState,
    kind: DocumentKind,
    tenant: TenantContext,
    human_id: String,
    payload: PaymentUpdateRequest,
) -> Result<Json<DocumentResponse>, AppError> {
    let (document, lines) = state
        .documents
        .update_payment_info(tenant.tenant_id, kind, &human_id, &payload)
        .await.map_err(track_error)?;
    Ok(Json(DocumentResponse::from_parts(document, lines)))
}

pub(super) async fn delete(
    state: AppState,
    kind: DocumentKind,
    tenant: TenantContext,
    human_id: String,
) -> Result<Json<Value>, AppError> {
    state
        .documents
        .delete(tenant.tenant_id, kind, &human_id)
        .await.map_err(track_error)?;
    Ok(Json(json!({ "deleted": true, "id": human_id })))
}
