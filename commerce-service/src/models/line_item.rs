//! Line item model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Line item row. Lines belong to exactly one document and are numbered
/// contiguously from 1 in input order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentLine {
    pub line_id: Uuid,
    pub document_id: Uuid,
    pub tenant_id: Uuid,
    pub line_number: i32,
    pub product_id: Option<Uuid>,
    pub item_code: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_of_measure: Option<String>,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub tax_rate: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub line_amount: Decimal,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// A fully-computed line ready for insertion.
#[derive(Debug, Clone)]
pub struct NewLine {
    pub line_number: i32,
    pub product_id: Option<Uuid>,
    pub item_code: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_of_measure: Option<String>,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub tax_rate: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub line_amount: Decimal,
    pub notes: Option<String>,
}
