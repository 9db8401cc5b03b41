//! Cross-document derivation: invoice-from-order and
//! bill-from-purchase-order.
//!
//! Derivation copies the source's lines and counterparty snapshot, resolves
//! a missing location (source location, then tenant headquarters) and a
//! missing due date (payment terms), and hands the assembled request back to
//! the lifecycle engine with the provenance link set. The reverse lookup
//! blocks cancelling a source that still has an outstanding derived
//! document.

use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;

use crate::domain::status::{DocumentKind, DocumentStatus};
use crate::domain::terms::due_date_for_terms;
use crate::dtos::{CreateDocumentRequest, FromSourceRequest, LineItemRequest};
use crate::models::Document;
use crate::services::{Database, MasterDataLookup};

/// Load and check the source, then assemble the create request for the
/// derived document. Returns the request plus the source's document id for
/// the provenance link.
pub async fn derive_request(
    db: &Database,
    master_data: &dyn MasterDataLookup,
    tenant_id: Uuid,
    kind: DocumentKind,
    request: &FromSourceRequest,
) -> Result<(CreateDocumentRequest, Uuid), AppError> {
    let source_kind = kind.source_kind().ok_or_else(|| {
        AppError::BusinessRule(anyhow::anyhow!(
            "a {} cannot be derived from another document",
            kind.display_name()
        ))
    })?;

    let source = db
        .get_document(tenant_id, source_kind, &request.source_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "Source {} '{}' not found",
                source_kind.display_name(),
                request.source_id
            ))
        })?;

    match source.status() {
        DocumentStatus::Draft => {
            return Err(AppError::BusinessRule(anyhow::anyhow!(
                "cannot create a {} from a draft {}",
                kind.display_name(),
                source_kind.display_name()
            )));
        }
        DocumentStatus::Cancelled => {
            return Err(AppError::BusinessRule(anyhow::anyhow!(
                "cannot create a {} from a cancelled {}",
                kind.display_name(),
                source_kind.display_name()
            )));
        }
        _ => {}
    }

    let source_lines = db.get_lines(tenant_id, source.document_id).await?;
    let items: Vec<LineItemRequest> = source_lines
        .into_iter()
        .map(|line| LineItemRequest {
            product_id: line.product_id,
            item_code: line.item_code,
            description: line.description,
            quantity: line.quantity,
            unit_of_measure: line.unit_of_measure,
            unit_price: line.unit_price,
            discount_percent: Some(line.discount_percent),
            tax_rate: Some(line.tax_rate),
            notes: line.notes,
        })
        .collect();

    let location_id = match request.location_id.or(source.location_id) {
        Some(id) => Some(id),
        None => master_data.headquarters(tenant_id).await?,
    };

    let issue_date = request
        .issue_date
        .unwrap_or_else(|| Utc::now().date_naive());

    // Terms resolution: explicit override, then the source document's terms,
    // then whatever the counterparty master record carries.
    let mut payment_terms = request
        .payment_terms
        .clone()
        .or_else(|| source.payment_terms.clone());
    if payment_terms.is_none() {
        if let Some(counterparty_id) = source.counterparty_id {
            payment_terms = master_data
                .counterparty(tenant_id, kind.counterparty_role(), counterparty_id)
                .await?
                .and_then(|record| record.payment_terms);
        }
    }

    let due_date = request
        .due_date
        .unwrap_or_else(|| due_date_for_terms(payment_terms.as_deref(), issue_date));

    let create = CreateDocumentRequest {
        counterparty_id: source.counterparty_id,
        counterparty_name: source.counterparty_name.clone(),
        counterparty_code: source.counterparty_code.clone(),
        location_id,
        issue_date: Some(issue_date),
        due_date: Some(due_date),
        expected_date: None,
        currency: Some(source.currency.clone()),
        shipping_charges: Some(request.shipping_charges.unwrap_or(source.shipping_charges)),
        payment_terms,
        notes: request.notes.clone(),
        items,
    };

    Ok((create, source.document_id))
}

/// Fail when the document still has an active, non-cancelled derivative.
pub async fn assert_no_active_derivatives(
    db: &Database,
    tenant_id: Uuid,
    document: &Document,
) -> Result<(), AppError> {
    if db
        .has_active_derived(tenant_id, document.document_id)
        .await?
    {
        return Err(AppError::BusinessRule(anyhow::anyhow!(
            "cannot cancel {} '{}' while a derived document is outstanding",
            document.kind().display_name(),
            document.human_id
        )));
    }
    Ok(())
}
