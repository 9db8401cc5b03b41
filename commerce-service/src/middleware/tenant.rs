//! Tenant context extraction.
//!
//! Tenant resolution itself lives upstream; requests arrive with the
//! already-resolved tenant id in the `X-Tenant-ID` header, and every
//! operation in the engine is scoped to it.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

pub const TENANT_ID_HEADER: &str = "X-Tenant-ID";

/// The tenant whose data scope bounds the current request.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub tenant_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!("Missing {} header", TENANT_ID_HEADER))
            })?;

        let tenant_id = raw.parse::<Uuid>().map_err(|_| {
            AppError::AuthError(anyhow::anyhow!("Invalid {} header", TENANT_ID_HEADER))
        })?;

        tracing::Span::current().record("tenant_id", raw);

        Ok(TenantContext { tenant_id })
    }
}
