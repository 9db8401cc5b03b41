//! Sales order endpoints.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::documents;
use crate::domain::status::DocumentKind;
use crate::dtos::{CreateDocumentRequest, ListQuery, StatusUpdateRequest, UpdateDocumentRequest};
use crate::middleware::TenantContext;
use crate::startup::AppState;

const KIND: DocumentKind = DocumentKind::Order;

pub async fn create_order(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::create(state, KIND, tenant, payload).await
}

pub async fn list_orders(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    documents::list(state, KIND, tenant, query).await
}

pub async fn get_order(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    documents::get(state, KIND, tenant, id).await
}

pub async fn update_order(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::update(state, KIND, tenant, id, payload).await
}

pub async fn update_order_status(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    documents::update_status(state, KIND, tenant, id, payload).await
}

pub async fn delete_order(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    documents::delete(state, KIND, tenant, id).await
}
