//! Invoice endpoints, including derivation from orders and payments.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::documents;
use crate::domain::status::DocumentKind;
use crate::dtos::{
    CreateDocumentRequest, FromSourceRequest, ListQuery, PaymentUpdateRequest,
    StatusUpdateRequest, UpdateDocumentRequest,
};
use crate::middleware::TenantContext;
use crate::startup::AppState;

const KIND: DocumentKind = DocumentKind::Invoice;

pub async fn create_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::create(state, KIND, tenant, payload).await
}

pub async fn create_invoice_from_order(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<FromSourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::create_from_source(state, KIND, tenant, payload).await
}

pub async fn list_invoices(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    documents::list(state, KIND, tenant, query).await
}

pub async fn get_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    documents::get(state, KIND, tenant, id).await
}

pub async fn update_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::update(state, KIND, tenant, id, payload).await
}

pub async fn update_invoice_status(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::update_status(state, KIND, tenant, id, payload).await
}

pub async fn update_invoice_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
    Json(payload): Json<PaymentUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::update_payment(state, KIND, tenant, id, payload).await
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    documents::delete(state, KIND, tenant, id).await
}
