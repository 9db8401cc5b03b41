//! Read-only views of master data owned by other services.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Customer or supplier snapshot used for ownership checks and defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CounterpartyRecord {
    pub counterparty_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub payment_terms: Option<String>,
}

/// Location snapshot; headquarters backs the location fallback on derivation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationRecord {
    pub location_id: Uuid,
    pub name: String,
    pub is_headquarters: bool,
}
