//! Document kinds and their status state machines.
//!
//! Each of the four document types owns a fixed directed acyclic status
//! graph. No edge returns to `draft`, and every status change in the system
//! passes through [`validate_transition`] — including the payment-driven
//! promotion to `partially_paid`/`paid`.

use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// The four commercial document types the engine manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Order,
    PurchaseOrder,
    Invoice,
    Bill,
}

/// Which side of the trade the counterparty sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartyRole {
    Customer,
    Supplier,
}

impl CounterpartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterpartyRole::Customer => "customer",
            CounterpartyRole::Supplier => "supplier",
        }
    }
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Order => "order",
            DocumentKind::PurchaseOrder => "purchase_order",
            DocumentKind::Invoice => "invoice",
            DocumentKind::Bill => "bill",
        }
    }

    /// Human-id prefix: SO001, PO001, INV001, BILL001.
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Order => "SO",
            DocumentKind::PurchaseOrder => "PO",
            DocumentKind::Invoice => "INV",
            DocumentKind::Bill => "BILL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentKind::Order => "sales order",
            DocumentKind::PurchaseOrder => "purchase order",
            DocumentKind::Invoice => "invoice",
            DocumentKind::Bill => "bill",
        }
    }

    pub fn counterparty_role(&self) -> CounterpartyRole {
        match self {
            DocumentKind::Order | DocumentKind::Invoice => CounterpartyRole::Customer,
            DocumentKind::PurchaseOrder | DocumentKind::Bill => CounterpartyRole::Supplier,
        }
    }

    /// Invoices and bills track payments (amount_paid / balance_due).
    pub fn is_payable(&self) -> bool {
        matches!(self, DocumentKind::Invoice | DocumentKind::Bill)
    }

    /// The kind a derived document is created from, if any.
    pub fn source_kind(&self) -> Option<DocumentKind> {
        match self {
            DocumentKind::Invoice => Some(DocumentKind::Order),
            DocumentKind::Bill => Some(DocumentKind::PurchaseOrder),
            _ => None,
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "purchase_order" => DocumentKind::PurchaseOrder,
            "invoice" => DocumentKind::Invoice,
            "bill" => DocumentKind::Bill,
            _ => DocumentKind::Order,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Union of the statuses across the four document graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Confirmed,
    InProduction,
    ReadyToShip,
    Shipped,
    Delivered,
    Sent,
    PartiallyReceived,
    Received,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Confirmed => "confirmed",
            DocumentStatus::InProduction => "in_production",
            DocumentStatus::ReadyToShip => "ready_to_ship",
            DocumentStatus::Shipped => "shipped",
            DocumentStatus::Delivered => "delivered",
            DocumentStatus::Sent => "sent",
            DocumentStatus::PartiallyReceived => "partially_received",
            DocumentStatus::Received => "received",
            DocumentStatus::PartiallyPaid => "partially_paid",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Overdue => "overdue",
            DocumentStatus::Cancelled => "cancelled",
        }
    }

    /// Lenient parse for values read back from storage.
    pub fn from_string(s: &str) -> Self {
        s.parse().unwrap_or(DocumentStatus::Draft)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "confirmed" => Ok(Self::Confirmed),
            "in_production" => Ok(Self::InProduction),
            "ready_to_ship" => Ok(Self::ReadyToShip),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "sent" => Ok(Self::Sent),
            "partially_received" => Ok(Self::PartiallyReceived),
            "received" => Ok(Self::Received),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown document status: {}", s)),
        }
    }
}

/// Every document starts in draft.
pub fn initial_status() -> DocumentStatus {
    DocumentStatus::Draft
}

/// The closed status set of a document kind.
pub fn statuses_for(kind: DocumentKind) -> &'static [DocumentStatus] {
    use DocumentStatus::*;
    match kind {
        DocumentKind::Order => &[
            Draft,
            Confirmed,
            InProduction,
            ReadyToShip,
            Shipped,
            Delivered,
            Cancelled,
        ],
        DocumentKind::PurchaseOrder => {
            &[Draft, Sent, Confirmed, PartiallyReceived, Received, Cancelled]
        }
        DocumentKind::Invoice => &[Draft, Sent, PartiallyPaid, Paid, Overdue, Cancelled],
        DocumentKind::Bill => &[Draft, Received, PartiallyPaid, Paid, Overdue, Cancelled],
    }
}

/// Legal next statuses from `from` for the given kind.
pub fn allowed_transitions(kind: DocumentKind, from: DocumentStatus) -> &'static [DocumentStatus] {
    use DocumentStatus::*;
    match kind {
        DocumentKind::Order => match from {
            Draft => &[Confirmed, Cancelled],
            Confirmed => &[InProduction, Cancelled],
            InProduction => &[ReadyToShip, Cancelled],
            ReadyToShip => &[Shipped],
            Shipped => &[Delivered],
            _ => &[],
        },
        DocumentKind::PurchaseOrder => match from {
            Draft => &[Sent, Cancelled],
            Sent => &[Confirmed, Cancelled],
            Confirmed => &[PartiallyReceived, Received, Cancelled],
            PartiallyReceived => &[Received],
            _ => &[],
        },
        DocumentKind::Invoice => match from {
            Draft => &[Sent, Cancelled],
            Sent => &[PartiallyPaid, Paid, Overdue, Cancelled],
            PartiallyPaid => &[Paid, Overdue],
            Overdue => &[PartiallyPaid, Paid],
            _ => &[],
        },
        DocumentKind::Bill => match from {
            Draft => &[Received, Cancelled],
            Received => &[PartiallyPaid, Paid, Overdue, Cancelled],
            PartiallyPaid => &[Paid, Overdue],
            Overdue => &[PartiallyPaid, Paid],
            _ => &[],
        },
    }
}

/// True when the status has no outgoing edges for the kind.
pub fn is_terminal(kind: DocumentKind, status: DocumentStatus) -> bool {
    allowed_transitions(kind, status).is_empty()
}

/// True when the status belongs to the kind's graph at all.
pub fn is_valid_status(kind: DocumentKind, status: DocumentStatus) -> bool {
    statuses_for(kind).contains(&status)
}

/// The single authority on status-change legality.
pub fn validate_transition(
    kind: DocumentKind,
    from: DocumentStatus,
    to: DocumentStatus,
) -> Result<(), AppError> {
    let allowed = allowed_transitions(kind, from);
    if allowed.contains(&to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
            allowed: allowed.iter().map(|s| s.as_str().to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentStatus::*;

    #[test]
    fn order_happy_path_is_legal() {
        let path = [Draft, Confirmed, InProduction, ReadyToShip, Shipped, Delivered];
        for pair in path.windows(2) {
            validate_transition(DocumentKind::Order, pair[0], pair[1])
                .expect("forward edge should be legal");
        }
    }

    #[test]
    fn no_edge_returns_to_draft() {
        for &kind in &[
            DocumentKind::Order,
            DocumentKind::PurchaseOrder,
            DocumentKind::Invoice,
            DocumentKind::Bill,
        ] {
            for &status in statuses_for(kind) {
                assert!(
                    !allowed_transitions(kind, status).contains(&Draft),
                    "{} allows {} -> draft",
                    kind,
                    status
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        assert!(is_terminal(DocumentKind::Order, Delivered));
        assert!(is_terminal(DocumentKind::Order, Cancelled));
        assert!(is_terminal(DocumentKind::PurchaseOrder, Received));
        assert!(is_terminal(DocumentKind::Invoice, Paid));
        assert!(is_terminal(DocumentKind::Bill, Paid));
        assert!(!is_terminal(DocumentKind::Invoice, Overdue));
    }

    #[test]
    fn shipped_order_cannot_be_cancelled() {
        let err = validate_transition(DocumentKind::Order, ReadyToShip, Cancelled).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to, allowed } => {
                assert_eq!(from, "ready_to_ship");
                assert_eq!(to, "cancelled");
                assert_eq!(allowed, vec!["shipped".to_string()]);
            }
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn draft_invoice_cannot_jump_to_paid() {
        let err = validate_transition(DocumentKind::Invoice, Draft, Paid).unwrap_err();
        match err {
            AppError::InvalidTransition { allowed, .. } => {
                assert_eq!(allowed, vec!["sent".to_string(), "cancelled".to_string()]);
            }
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn invoice_and_bill_graphs_differ_only_in_the_issued_status() {
        assert_eq!(
            allowed_transitions(DocumentKind::Invoice, Sent),
            allowed_transitions(DocumentKind::Bill, Received),
        );
        assert!(allowed_transitions(DocumentKind::Invoice, Draft).contains(&Sent));
        assert!(allowed_transitions(DocumentKind::Bill, Draft).contains(&Received));
    }

    #[test]
    fn overdue_invoice_can_still_collect_payment() {
        validate_transition(DocumentKind::Invoice, Overdue, PartiallyPaid).unwrap();
        validate_transition(DocumentKind::Invoice, Overdue, Paid).unwrap();
        assert!(validate_transition(DocumentKind::Invoice, Overdue, Cancelled).is_err());
    }

    #[test]
    fn purchase_order_partial_receipt_only_completes() {
        assert_eq!(
            allowed_transitions(DocumentKind::PurchaseOrder, PartiallyReceived),
            &[Received]
        );
    }

    #[test]
    fn validity_is_a_pure_function_of_the_pair() {
        // Same pair, same verdict, regardless of how often it is asked.
        for _ in 0..3 {
            assert!(validate_transition(DocumentKind::Order, Draft, Confirmed).is_ok());
            assert!(validate_transition(DocumentKind::Order, Draft, Shipped).is_err());
        }
    }

    #[test]
    fn status_strings_round_trip() {
        for &kind in &[
            DocumentKind::Order,
            DocumentKind::PurchaseOrder,
            DocumentKind::Invoice,
            DocumentKind::Bill,
        ] {
            for &status in statuses_for(kind) {
                assert_eq!(status.as_str().parse::<DocumentStatus>(), Ok(status));
            }
        }
    }

    #[test]
    fn foreign_statuses_are_rejected_per_kind() {
        assert!(!is_valid_status(DocumentKind::Order, Paid));
        assert!(!is_valid_status(DocumentKind::Invoice, Shipped));
        assert!(!is_valid_status(DocumentKind::Bill, Sent));
        assert!(is_valid_status(DocumentKind::PurchaseOrder, Sent));
    }

    #[test]
    fn kind_prefixes_are_stable() {
        assert_eq!(DocumentKind::Order.prefix(), "SO");
        assert_eq!(DocumentKind::PurchaseOrder.prefix(), "PO");
        assert_eq!(DocumentKind::Invoice.prefix(), "INV");
        assert_eq!(DocumentKind::Bill.prefix(), "BILL");
    }
}
