//! Master-data ownership checks.
//!
//! Customers, suppliers, products, and locations are owned by other parts of
//! the system; the engine only confirms that a foreign id belongs to the
//! tenant before trusting it, and resolves tenant defaults (headquarters).

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::domain::status::CounterpartyRole;
use crate::models::{CounterpartyRecord, LocationRecord};

#[async_trait]
pub trait MasterDataLookup: Send + Sync {
    /// The customer or supplier with this id, if the tenant owns it.
    async fn counterparty(
        &self,
        tenant_id: Uuid,
        role: CounterpartyRole,
        id: Uuid,
    ) -> Result<Option<CounterpartyRecord>, AppError>;

    /// The location with this id, if the tenant owns it.
    async fn location(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<LocationRecord>, AppError>;

    /// The tenant's headquarters location, if one is flagged.
    async fn headquarters(&self, tenant_id: Uuid) -> Result<Option<Uuid>, AppError>;

    /// Whether the tenant owns a product with this id.
    async fn product_exists(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

/// Postgres-backed lookup against the master tables.
#[derive(Clone)]
pub struct PgMasterData {
    pool: PgPool,
}

impl PgMasterData {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MasterDataLookup for PgMasterData {
    async fn counterparty(
        &self,
        tenant_id: Uuid,
        role: CounterpartyRole,
        id: Uuid,
    ) -> Result<Option<CounterpartyRecord>, AppError> {
        let query = match role {
            CounterpartyRole::Customer => {
                r#"
                SELECT customer_id AS counterparty_id, name, code, payment_terms
                FROM customers
                WHERE tenant_id = $1 AND customer_id = $2 AND is_active = TRUE
                "#
            }
            CounterpartyRole::Supplier => {
                r#"
                SELECT supplier_id AS counterparty_id, name, code, payment_terms
                FROM suppliers
                WHERE tenant_id = $1 AND supplier_id = $2 AND is_active = TRUE
                "#
            }
        };

        sqlx::query_as::<_, CounterpartyRecord>(query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to look up counterparty: {}", e))
            })
    }

    async fn location(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<LocationRecord>, AppError> {
        sqlx::query_as::<_, LocationRecord>(
            r#"
            SELECT location_id, name, is_headquarters
            FROM locations
            WHERE tenant_id = $1 AND location_id = $2 AND is_active = TRUE
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to look up location: {}", e)))
    }

    async fn headquarters(&self, tenant_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT location_id
            FROM locations
            WHERE tenant_id = $1 AND is_headquarters = TRUE AND is_active = TRUE
            ORDER BY created_utc
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to look up headquarters: {}", e))
        })?;

        Ok(row.map(|(id,)| id))
    }

    async fn product_exists(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT product_id
            FROM products
            WHERE tenant_id = $1 AND product_id = $2 AND is_active = TRUE
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to look up product: {}", e))
        })?;

        Ok(row.is_some())
    }
}
