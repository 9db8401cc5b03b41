//! The document lifecycle engine.
//!
//! One engine serves all four document types; `DocumentKind` carries the
//! per-type differences (id prefix, counterparty role, payability, and the
//! status graph consulted through `domain::status`). All validation happens
//! before any write; the write itself is a single transaction in the
//! database service.

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::{AppError, FieldError};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::domain::ledger::{self, LinePricing};
use crate::domain::status::{
    self, DocumentKind, DocumentStatus,
};
use crate::dtos::{
    CreateDocumentRequest, FromSourceRequest, LineItemRequest, ListQuery, PaymentUpdateRequest,
    StatusUpdateRequest, UpdateDocumentRequest,
};
use crate::models::{
    Document, DocumentFilter, DocumentLine, HeaderPatch, NewDocument, NewLine, PaymentUpdate,
    StatusChange,
};
use crate::services::metrics::{
    DOCUMENTS_CREATED_TOTAL, PAYMENT_AMOUNT_TOTAL, STATUS_TRANSITIONS_TOTAL,
};
use crate::services::{linker, Database, MasterDataLookup};

const DEFAULT_PAGE_SIZE: i32 = 50;
const DEFAULT_CURRENCY: &str = "USD";

/// Lifecycle service instantiated once and parameterised per call by kind.
#[derive(Clone)]
pub struct DocumentService {
    db: Arc<Database>,
    master_data: Arc<dyn MasterDataLookup>,
}

impl DocumentService {
    pub fn new(db: Arc<Database>, master_data: Arc<dyn MasterDataLookup>) -> Self {
        Self { db, master_data }
    }

    /// Create a document from a full header + items request.
    ///
    /// `source_document_id` is only ever set by the linker; callers of the
    /// plain create endpoints cannot inject provenance.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id, doc_type = %kind))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        request: &CreateDocumentRequest,
        source_document_id: Option<Uuid>,
    ) -> Result<(Document, Vec<DocumentLine>), AppError> {
        request.validate().map_err(AppError::from)?;
        self.check_references(
            tenant_id,
            kind,
            request.counterparty_id,
            request.location_id,
            &request.items,
        )
        .await?;
        require_products_without_source(kind, source_document_id, &request.items)?;

        let (computed, totals) = compute_ledger(
            &request.items,
            request.shipping_charges.unwrap_or(Decimal::ZERO),
        );

        let document = NewDocument {
            tenant_id,
            kind,
            counterparty_id: request.counterparty_id,
            counterparty_name: request.counterparty_name.clone(),
            counterparty_code: request.counterparty_code.clone(),
            location_id: request.location_id,
            issue_date: request
                .issue_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            due_date: request.due_date,
            expected_date: request.expected_date,
            currency: request
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            tax_amount: totals.tax_amount,
            shipping_charges: totals.shipping_charges,
            total_amount: totals.total_amount,
            source_document_id,
            payment_terms: request.payment_terms.clone(),
            notes: request.notes.clone(),
        };

        let created = self.db.create_document(&document, &computed).await?;
        DOCUMENTS_CREATED_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();
        Ok(created)
    }

    /// Derive an invoice from an order or a bill from a purchase order.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id, doc_type = %kind, source_id = %request.source_id))]
    pub async fn create_from_source(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        request: &FromSourceRequest,
    ) -> Result<(Document, Vec<DocumentLine>), AppError> {
        request.validate().map_err(AppError::from)?;

        let (create, source_document_id) =
            linker::derive_request(&self.db, self.master_data.as_ref(), tenant_id, kind, request)
                .await?;

        self.create(tenant_id, kind, &create, Some(source_document_id))
            .await
    }

    /// Tenant-scoped fetch by human id, including lines.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, doc_type = %kind, human_id = %human_id))]
    pub async fn get(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
    ) -> Result<(Document, Vec<DocumentLine>), AppError> {
        let document = self.load(tenant_id, kind, human_id).await?;
        let lines = self.db.get_lines(tenant_id, document.document_id).await?;
        Ok((document, lines))
    }

    /// Header-only summaries matching the filters, newest first.
    #[instrument(skip(self, query), fields(tenant_id = %tenant_id, doc_type = %kind))]
    pub async fn list(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        query: &ListQuery,
    ) -> Result<Vec<Document>, AppError> {
        let status = match &query.status {
            Some(raw) => Some(parse_status(kind, raw)?),
            None => None,
        };

        let filter = DocumentFilter {
            status,
            counterparty_id: query.counterparty_id,
            counterparty_name: query.counterparty_name.clone(),
            location_id: query.location_id,
            start_date: query.start_date,
            end_date: query.end_date,
            page_size: query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        };

        self.db.list_documents(tenant_id, kind, &filter).await
    }

    /// Update a document. Supplying `items` replaces the whole line list and
    /// recomputes every aggregate from scratch; that path is draft-only.
    /// Header fields stay patchable through wider states.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id, doc_type = %kind, human_id = %human_id))]
    pub async fn update(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
        request: &UpdateDocumentRequest,
    ) -> Result<(Document, Vec<DocumentLine>), AppError> {
        request.validate().map_err(AppError::from)?;

        let document = self.load(tenant_id, kind, human_id).await?;
        self.check_references(
            tenant_id,
            kind,
            request.counterparty_id,
            request.location_id,
            request.items.as_deref().unwrap_or(&[]),
        )
        .await?;

        let patch = header_patch(request);

        if let Some(items) = &request.items {
            if document.status() != DocumentStatus::Draft {
                return Err(AppError::BusinessRule(anyhow::anyhow!(
                    "cannot modify line items of a non-draft document"
                )));
            }
            require_products_without_source(kind, document.source_document_id, items)?;

            let shipping = request
                .shipping_charges
                .unwrap_or(document.shipping_charges);
            let (computed, totals) = compute_ledger(items, shipping);
            let balance_due = totals.total_amount - document.amount_paid;

            let replaced = self
                .db
                .replace_lines(
                    tenant_id, kind, human_id, &patch, &totals, balance_due, &computed,
                )
                .await?;
            replaced.ok_or_else(concurrent_modification)
        } else {
            let mut patch = patch;
            if let Some(shipping) = request.shipping_charges {
                // Shipping feeds the total, so a header-only shipping change
                // still recomputes the derived amounts.
                let total = document.subtotal - document.discount_amount
                    + document.tax_amount
                    + shipping;
                patch.total_amount = Some(total);
                patch.balance_due = Some(total - document.amount_paid);
            }

            let updated = self
                .db
                .update_header(tenant_id, kind, human_id, &patch)
                .await?
                .ok_or_else(concurrent_modification)?;
            let lines = self.db.get_lines(tenant_id, updated.document_id).await?;
            Ok((updated, lines))
        }
    }

    /// Record a payment: recompute the balance and promote the status when
    /// the amounts call for it. The promotion passes through the same
    /// transition validator as the explicit endpoint.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id, doc_type = %kind, human_id = %human_id))]
    pub async fn update_payment_info(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
        request: &PaymentUpdateRequest,
    ) -> Result<(Document, Vec<DocumentLine>), AppError> {
        if !kind.is_payable() {
            return Err(AppError::BusinessRule(anyhow::anyhow!(
                "payments apply only to invoices and bills"
            )));
        }
        request.validate().map_err(AppError::from)?;

        let document = self.load(tenant_id, kind, human_id).await?;
        let current = document.status();
        let balance_due = document.total_amount - request.amount_paid;

        let target = if balance_due <= Decimal::ZERO {
            Some(DocumentStatus::Paid)
        } else if request.amount_paid > Decimal::ZERO {
            Some(DocumentStatus::PartiallyPaid)
        } else {
            None
        };

        let new_status = match target {
            Some(t) if t != current => {
                status::validate_transition(kind, current, t)?;
                t
            }
            _ => current,
        };

        let update = PaymentUpdate {
            amount_paid: request.amount_paid,
            balance_due,
            status: new_status,
            payment_method: request.payment_method.clone(),
            payment_date: request.payment_date,
            payment_reference: request.payment_reference.clone(),
        };

        let updated = self
            .db
            .update_payment(tenant_id, kind, human_id, &update)
            .await?
            .ok_or_else(concurrent_modification)?;

        PAYMENT_AMOUNT_TOTAL
            .with_label_values(&[updated.currency.as_str()])
            .inc_by(request.amount_paid.to_f64().unwrap_or(0.0));

        let lines = self.db.get_lines(tenant_id, updated.document_id).await?;
        Ok((updated, lines))
    }

    /// Explicit status transition with side-effect fields.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id, doc_type = %kind, human_id = %human_id, status = %request.status))]
    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
        request: &StatusUpdateRequest,
    ) -> Result<(Document, Vec<DocumentLine>), AppError> {
        request.validate().map_err(AppError::from)?;
        let target = parse_status(kind, &request.status)?;

        let document = self.load(tenant_id, kind, human_id).await?;
        status::validate_transition(kind, document.status(), target)?;

        if target == DocumentStatus::Cancelled && kind.source_kind().is_none() {
            linker::assert_no_active_derivatives(&self.db, tenant_id, &document).await?;
        }

        let today = Utc::now().date_naive();
        let change = StatusChange {
            status: target,
            carrier: request.carrier.clone(),
            tracking_number: request.tracking_number.clone(),
            shipped_date: match target {
                DocumentStatus::Shipped => Some(request.shipped_date.unwrap_or(today)),
                _ => request.shipped_date,
            },
            delivered_date: match target {
                DocumentStatus::Delivered => Some(request.delivered_date.unwrap_or(today)),
                _ => request.delivered_date,
            },
            received_date: match target {
                DocumentStatus::Received | DocumentStatus::PartiallyReceived => {
                    Some(request.received_date.unwrap_or(today))
                }
                _ => request.received_date,
            },
        };

        let updated = self
            .db
            .update_status(tenant_id, kind, human_id, &change)
            .await?
            .ok_or_else(concurrent_modification)?;

        STATUS_TRANSITIONS_TOTAL
            .with_label_values(&[kind.as_str(), target.as_str()])
            .inc();

        let lines = self.db.get_lines(tenant_id, updated.document_id).await?;
        Ok((updated, lines))
    }

    /// Soft-delete a draft document. Anything past draft stays on record.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, doc_type = %kind, human_id = %human_id))]
    pub async fn delete(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
    ) -> Result<(), AppError> {
        let document = self.load(tenant_id, kind, human_id).await?;
        if document.status() != DocumentStatus::Draft {
            return Err(AppError::BusinessRule(anyhow::anyhow!(
                "only draft documents can be deleted; non-draft documents are preserved for the audit trail"
            )));
        }

        let deleted = self.db.soft_delete(tenant_id, kind, human_id).await?;
        if !deleted {
            return Err(concurrent_modification());
        }
        Ok(())
    }

    async fn load(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
    ) -> Result<Document, AppError> {
        self.db
            .get_document(tenant_id, kind, human_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "{} '{}' not found",
                    capitalize(kind.display_name()),
                    human_id
                ))
            })
    }

    /// Confirm tenant ownership of every referenced foreign id before any
    /// write.
    async fn check_references(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        counterparty_id: Option<Uuid>,
        location_id: Option<Uuid>,
        items: &[LineItemRequest],
    ) -> Result<(), AppError> {
        if let Some(id) = counterparty_id {
            let role = kind.counterparty_role();
            self.master_data
                .counterparty(tenant_id, role, id)
                .await?
                .ok_or_else(|| {
                    AppError::UnknownReference(anyhow::anyhow!(
                        "{} '{}' not found for this tenant",
                        capitalize(role.as_str()),
                        id
                    ))
                })?;
        }

        if let Some(id) = location_id {
            self.master_data
                .location(tenant_id, id)
                .await?
                .ok_or_else(|| {
                    AppError::UnknownReference(anyhow::anyhow!(
                        "Location '{}' not found for this tenant",
                        id
                    ))
                })?;
        }

        for item in items {
            if let Some(product_id) = item.product_id {
                if !self
                    .master_data
                    .product_exists(tenant_id, product_id)
                    .await?
                {
                    return Err(AppError::UnknownReference(anyhow::anyhow!(
                        "Product '{}' not found for this tenant",
                        product_id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Without a provenance link, every line must name a product.
fn require_products_without_source(
    kind: DocumentKind,
    source_document_id: Option<Uuid>,
    items: &[LineItemRequest],
) -> Result<(), AppError> {
    if source_document_id.is_some() {
        return Ok(());
    }
    if items.iter().any(|item| item.product_id.is_none()) {
        return Err(AppError::BusinessRule(anyhow::anyhow!(
            "every line item must reference a product when the {} has no source document",
            kind.display_name()
        )));
    }
    Ok(())
}

/// Run the ledger over request lines; numbering follows array position.
fn compute_ledger(
    items: &[LineItemRequest],
    shipping_charges: Decimal,
) -> (Vec<NewLine>, ledger::DocumentTotals) {
    let pricings: Vec<LinePricing> = items
        .iter()
        .map(|item| LinePricing {
            quantity: item.quantity,
            unit_price: item.unit_price,
            discount_percent: item.discount_percent.unwrap_or(Decimal::ZERO),
            tax_rate: item.tax_rate.unwrap_or(Decimal::ZERO),
        })
        .collect();

    let (amounts, totals) = ledger::compute_document(&pricings, shipping_charges);

    let lines = items
        .iter()
        .zip(amounts)
        .enumerate()
        .map(|(index, (item, amounts))| NewLine {
            line_number: index as i32 + 1,
            product_id: item.product_id,
            item_code: item.item_code.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            unit_of_measure: item.unit_of_measure.clone(),
            unit_price: item.unit_price,
            discount_percent: item.discount_percent.unwrap_or(Decimal::ZERO),
            tax_rate: item.tax_rate.unwrap_or(Decimal::ZERO),
            discount_amount: amounts.discount_amount,
            tax_amount: amounts.tax_amount,
            line_amount: amounts.line_amount,
            notes: item.notes.clone(),
        })
        .collect();

    (lines, totals)
}

fn header_patch(request: &UpdateDocumentRequest) -> HeaderPatch {
    HeaderPatch {
        counterparty_id: request.counterparty_id,
        counterparty_name: request.counterparty_name.clone(),
        counterparty_code: request.counterparty_code.clone(),
        location_id: request.location_id,
        issue_date: request.issue_date,
        due_date: request.due_date,
        expected_date: request.expected_date,
        currency: request.currency.clone(),
        shipping_charges: request.shipping_charges,
        payment_terms: request.payment_terms.clone(),
        payment_method: request.payment_method.clone(),
        payment_date: request.payment_date,
        payment_reference: request.payment_reference.clone(),
        notes: request.notes.clone(),
        total_amount: None,
        balance_due: None,
    }
}

fn parse_status(kind: DocumentKind, raw: &str) -> Result<DocumentStatus, AppError> {
    let status: DocumentStatus = raw.parse().map_err(|_| {
        AppError::Validation(vec![FieldError::new(
            "status",
            format!("unknown status '{}'", raw),
        )])
    })?;
    if !status::is_valid_status(kind, status) {
        return Err(AppError::Validation(vec![FieldError::new(
            "status",
            format!(
                "'{}' is not a {} status",
                status.as_str(),
                kind.display_name()
            ),
        )]));
    }
    Ok(status)
}

fn concurrent_modification() -> AppError {
    AppError::Conflict(anyhow::anyhow!("document was modified concurrently"))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
