//! Document DTOs.
//!
//! Purchase documents (purchase orders, bills) may post `unit_cost` for the
//! price field; it lands on the canonical `unit_price` via a serde alias.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{Document, DocumentLine};

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be greater than 0".into());
        Err(err)
    }
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        Err(err)
    }
}

fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO && *value <= Decimal::ONE_HUNDRED {
        Ok(())
    } else {
        let mut err = ValidationError::new("percent");
        err.message = Some("must be between 0 and 100".into());
        Err(err)
    }
}

/// One line item in a create or update request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemRequest {
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1, message = "item_code is required"))]
    pub item_code: String,
    pub description: Option<String>,
    #[validate(custom(function = validate_positive))]
    pub quantity: Decimal,
    pub unit_of_measure: Option<String>,
    #[serde(alias = "unit_cost")]
    #[validate(custom(function = validate_non_negative))]
    pub unit_price: Decimal,
    #[validate(custom(function = validate_percent))]
    pub discount_percent: Option<Decimal>,
    #[validate(custom(function = validate_percent))]
    pub tax_rate: Option<Decimal>,
    pub notes: Option<String>,
}

/// Body of `POST /{orders|purchase-orders|invoices|bills}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    pub counterparty_id: Option<Uuid>,
    #[validate(length(min = 1, message = "counterparty_name is required"))]
    pub counterparty_name: String,
    pub counterparty_code: Option<String>,
    pub location_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
    #[validate(custom(function = validate_non_negative))]
    pub shipping_charges: Option<Decimal>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LineItemRequest>,
}

/// Body of `PUT /{type}/:id`. Supplying `items` replaces the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDocumentRequest {
    pub counterparty_id: Option<Uuid>,
    #[validate(length(min = 1, message = "counterparty_name must not be empty"))]
    pub counterparty_name: Option<String>,
    pub counterparty_code: Option<String>,
    pub location_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
    #[validate(custom(function = validate_non_negative))]
    pub shipping_charges: Option<Decimal>,
    pub payment_terms: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    #[validate(nested)]
    pub items: Option<Vec<LineItemRequest>>,
}

/// Body of `POST /invoices/from-order` and `POST /bills/from-purchase-order`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FromSourceRequest {
    #[validate(length(min = 1, message = "source_id is required"))]
    pub source_id: String,
    pub location_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_terms: Option<String>,
    #[validate(custom(function = validate_non_negative))]
    pub shipping_charges: Option<Decimal>,
    pub notes: Option<String>,
}

/// Body of `PATCH /{type}/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
}

/// Body of `PATCH /{invoices|bills}/:id/payment`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentUpdateRequest {
    #[validate(custom(function = validate_non_negative))]
    pub amount_paid: Decimal,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub payment_reference: Option<String>,
}

/// Query parameters of `GET /{type}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub counterparty_id: Option<Uuid>,
    pub counterparty_name: Option<String>,
    pub location_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page_size: Option<i32>,
}

/// A line item in a detail response.
#[derive(Debug, Clone, Serialize)]
pub struct LineItemResponse {
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

impl From<DocumentLine> for LineItemResponse {
    fn from(line: DocumentLine) -> Self {
        Self {
            line_number: line.line_number,
            product_id: line.product_id,
            item_code: line.item_code,
            description: line.description,
            quantity: line.quantity,
            unit_of_measure: line.unit_of_measure,
            unit_price: line.unit_price,
            discount_percent: line.discount_percent,
            tax_rate: line.tax_rate,
            discount_amount: line.discount_amount,
            tax_amount: line.tax_amount,
            line_amount: line.line_amount,
            notes: line.notes,
        }
    }
}

/// Full document representation including line items.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub document_id: Uuid,
    pub human_id: String,
    pub doc_type: String,
    pub status: String,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_due: Option<Decimal>,
    pub source_document_id: Option<Uuid>,
    pub payment_terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<LineItemResponse>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn from_parts(document: Document, lines: Vec<DocumentLine>) -> Self {
        let payable = document.kind().is_payable();
        Self {
            document_id: document.document_id,
            human_id: document.human_id,
            doc_type: document.doc_type,
            status: document.status,
            counterparty_id: document.counterparty_id,
            counterparty_name: document.counterparty_name,
            counterparty_code: document.counterparty_code,
            location_id: document.location_id,
            issue_date: document.issue_date,
            due_date: document.due_date,
            expected_date: document.expected_date,
            currency: document.currency,
            subtotal: document.subtotal,
            discount_amount: document.discount_amount,
            tax_amount: document.tax_amount,
            shipping_charges: document.shipping_charges,
            total_amount: document.total_amount,
            amount_paid: payable.then_some(document.amount_paid),
            balance_due: payable.then_some(document.balance_due),
            source_document_id: document.source_document_id,
            payment_terms: document.payment_terms,
            carrier: document.carrier,
            tracking_number: document.tracking_number,
            shipped_date: document.shipped_date,
            delivered_date: document.delivered_date,
            received_date: document.received_date,
            payment_method: document.payment_method,
            payment_date: document.payment_date,
            payment_reference: document.payment_reference,
            notes: document.notes,
            items: lines.into_iter().map(LineItemResponse::from).collect(),
            created_utc: document.created_utc,
            updated_utc: document.updated_utc,
        }
    }
}

/// Header-only summary used by list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummaryResponse {
    pub document_id: Uuid,
    pub human_id: String,
    pub doc_type: String,
    pub status: String,
    pub counterparty_id: Option<Uuid>,
    pub counterparty_name: String,
    pub location_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub currency: String,
    pub total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_due: Option<Decimal>,
    pub created_utc: DateTime<Utc>,
}

impl From<Document> for DocumentSummaryResponse {
    fn from(document: Document) -> Self {
        let payable = document.kind().is_payable();
        Self {
            document_id: document.document_id,
            human_id: document.human_id,
            doc_type: document.doc_type,
            status: document.status,
            counterparty_id: document.counterparty_id,
            counterparty_name: document.counterparty_name,
            location_id: document.location_id,
            issue_date: document.issue_date,
            due_date: document.due_date,
            expected_date: document.expected_date,
            currency: document.currency,
            total_amount: document.total_amount,
            balance_due: payable.then_some(document.balance_due),
            created_utc: document.created_utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: &str, price: &str) -> LineItemRequest {
        LineItemRequest {
            product_id: Some(Uuid::new_v4()),
            item_code: "WIDGET-1".to_string(),
            description: None,
            quantity: quantity.parse().unwrap(),
            unit_of_measure: None,
            unit_price: price.parse().unwrap(),
            discount_percent: None,
            tax_rate: None,
            notes: None,
        }
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let mut item = line("0", "10");
        item.quantity = Decimal::ZERO;
        assert!(item.validate().is_err());
    }

    #[test]
    fn discount_over_100_fails_validation() {
        let mut item = line("1", "10");
        item.discount_percent = Some("101".parse().unwrap());
        assert!(item.validate().is_err());
        item.discount_percent = Some("100".parse().unwrap());
        assert!(item.validate().is_ok());
    }

    #[test]
    fn empty_item_code_fails_validation() {
        let mut item = line("1", "10");
        item.item_code = String::new();
        assert!(item.validate().is_err());
    }

    #[test]
    fn unit_cost_lands_on_unit_price() {
        let json = r#"{
            "item_code": "RAW-STEEL",
            "quantity": "4",
            "unit_cost": "12.75"
        }"#;
        let item: LineItemRequest = serde_json::from_str(json).unwrap();
        assert_eq!(item.unit_price, "12.75".parse().unwrap());
    }

    #[test]
    fn line_validation_bubbles_up_through_the_document() {
        let request = CreateDocumentRequest {
            counterparty_id: None,
            counterparty_name: "Acme GmbH".to_string(),
            counterparty_code: None,
            location_id: None,
            issue_date: None,
            due_date: None,
            expected_date: None,
            currency: Some("EUR".to_string()),
            shipping_charges: None,
            payment_terms: None,
            notes: None,
            items: vec![LineItemRequest {
                quantity: Decimal::NEGATIVE_ONE,
                ..line("1", "10")
            }],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn two_letter_currency_fails_validation() {
        let request = CreateDocumentRequest {
            counterparty_id: None,
            counterparty_name: "Acme GmbH".to_string(),
            counterparty_code: None,
            location_id: None,
            issue_date: None,
            due_date: None,
            expected_date: None,
            currency: Some("EU".to_string()),
            shipping_charges: None,
            payment_terms: None,
            notes: None,
            items: vec![],
        };
        assert!(request.validate().is_err());
    }
}
