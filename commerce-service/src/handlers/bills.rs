//! Supplier bill endpoints, including derivation from purchase orders and
//! payments.

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

const KIND: DocumentKind = DocumentKind::Bill;

pub async fn create_bill(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::create(state, KIND, tenant, payload).await
}

pub async fn create_bill_from_purchase_order(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<FromSourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::create_from_source(state, KIND, tenant, payload).await
}

pub async fn list_bills(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    documents::list(state, KIND, tenant, query).await
}

pub async fn get_bill(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    documents::get(state, KIND, tenant, id).await
}

pub async fn update_bill(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::update(state, KIND, tenant, id, payload).await
}

pub async fn update_bill_status(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::update_status(state, KIND, tenant, id, payload).await
}

pub async fn update_bill_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
    Json(payload): Json<PaymentUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::update_payment(state, KIND, tenant, id, payload).await
}

pub async fn delete_bill(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    documents::delete(state, KIND, tenant, id).await
}
