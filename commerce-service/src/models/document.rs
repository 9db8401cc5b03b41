//! Document header model shared by the four commercial document types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::status::{DocumentKind, DocumentStatus};

/// Document header row. `doc_type` discriminates the four concrete types.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub document_id: Uuid,
    pub tenant_id: Uuid,
    pub doc_type: String,
    pub human_id: String,
    pub counterparty_id: Option<Uuid>,
    pub counterparty_name: String,
    pub counterparty_code: Option<String>,
    pub location_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub status: String,
    pub currency: String,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_charges: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub source_document_id: Option<Uuid>,
    pub payment_terms: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_string(&self.doc_type)
    }

    pub fn status(&self) -> DocumentStatus {
        DocumentStatus::from_string(&self.status)
    }
}

/// Fully-computed header ready for insertion. Totals come from the ledger
/// calculator, never from the caller.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub tenant_id: Uuid,
    pub kind: DocumentKind,
    pub counterparty_id: Option<Uuid>,
    pub counterparty_name: String,
    pub counterparty_code: Option<String>,
    pub location_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub currency: String,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_charges: Decimal,
    pub total_amount: Decimal,
    pub source_document_id: Option<Uuid>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

/// Header fields patchable outside a line replacement. Totals are present
/// only when a shipping change forced a recomputation.
#[derive(Debug, Clone, Default)]
pub struct HeaderPatch {
    pub counterparty_id: Option<Uuid>,
    pub counterparty_name: Option<String>,
    pub counterparty_code: Option<String>,
    pub location_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub shipping_charges: Option<Decimal>,
    pub payment_terms: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub total_amount: Option<Decimal>,
    pub balance_due: Option<Decimal>,
}

/// Payment state applied by updatePaymentInfo.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub status: DocumentStatus,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub payment_reference: Option<String>,
}

/// A validated status transition plus its side-effect fields.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: DocumentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
}

/// Filter parameters for listing documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub status: Option<DocumentStatus>,
    pub counterparty_id: Option<Uuid>,
    pub counterparty_name: Option<String>,
    pub location_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page_size: i32,
}
