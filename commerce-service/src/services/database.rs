//! Database service for commerce-service.
//!
//! Every mutating operation here runs as one transaction: id allocation,
//! header writes, full line replacement, and total recomputation commit or
//! roll back together. Reads are plain point reads.

use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::ledger::DocumentTotals;
use crate::domain::sequence::next_human_id;
use crate::domain::status::{initial_status, DocumentKind};
use crate::models::{
    Document, DocumentFilter, DocumentLine, HeaderPatch, NewDocument, NewLine, PaymentUpdate,
    StatusChange,
};
use crate::services::metrics::DB_QUERY_DURATION;

const DOCUMENT_COLUMNS: &str = r#"document_id, tenant_id, doc_type, human_id,
    counterparty_id, counterparty_name, counterparty_code, location_id,
    issue_date, due_date, expected_date, status, currency,
    subtotal, discount_amount, tax_amount, shipping_charges, total_amount,
    amount_paid, balance_due, source_document_id, payment_terms,
    carrier, tracking_number, shipped_date, delivered_date, received_date,
    payment_method, payment_date, payment_reference,
    notes, is_active, created_utc, updated_utc"#;

const LINE_COLUMNS: &str = r#"line_id, document_id, tenant_id, line_number,
    product_id, item_code, description, quantity, unit_of_measure, unit_price,
    discount_percent, tax_rate, discount_amount, tax_amount, line_amount,
    notes, created_utc"#;

/// How often a human-id collision is retried before giving up.
const MAX_ID_ATTEMPTS: u32 = 3;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "commerce-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Document Operations
    // -------------------------------------------------------------------------

    /// Create a document: allocate its human id, insert the header and all
    /// lines in one transaction. A colliding id (concurrent creation under
    /// the same tenant) rolls back and retries with a fresh scan.
    #[instrument(skip(self, document, lines), fields(tenant_id = %document.tenant_id, doc_type = %document.kind))]
    pub async fn create_document(
        &self,
        document: &NewDocument,
        lines: &[NewLine],
    ) -> Result<(Document, Vec<DocumentLine>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_document"])
            .start_timer();

        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            match self.try_create_document(document, lines).await {
                Err(AppError::Conflict(e)) if attempt < MAX_ID_ATTEMPTS => {
                    warn!(attempt = attempt, error = %e, "Human id collision, retrying");
                    continue;
                }
                other => break other,
            }
        };

        timer.observe_duration();

        if let Ok((ref header, _)) = result {
            info!(
                document_id = %header.document_id,
                human_id = %header.human_id,
                "Document created"
            );
        }

        result
    }

    async fn try_create_document(
        &self,
        document: &NewDocument,
        lines: &[NewLine],
    ) -> Result<(Document, Vec<DocumentLine>), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT human_id FROM documents
            WHERE tenant_id = $1 AND doc_type = $2
            "#,
        )
        .bind(document.tenant_id)
        .bind(document.kind.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to scan ids: {}", e)))?;

        let existing: Vec<String> = existing.into_iter().map(|(id,)| id).collect();
        let human_id = next_human_id(document.kind.prefix(), &existing, Utc::now());

        let document_id = Uuid::new_v4();
        let insert = format!(
            r#"
            INSERT INTO documents (
                document_id, tenant_id, doc_type, human_id,
                counterparty_id, counterparty_name, counterparty_code, location_id,
                issue_date, due_date, expected_date, status, currency,
                subtotal, discount_amount, tax_amount, shipping_charges, total_amount,
                amount_paid, balance_due, source_document_id, payment_terms, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );

        let header = sqlx::query_as::<_, Document>(&insert)
            .bind(document_id)
            .bind(document.tenant_id)
            .bind(document.kind.as_str())
            .bind(&human_id)
            .bind(document.counterparty_id)
            .bind(&document.counterparty_name)
            .bind(&document.counterparty_code)
            .bind(document.location_id)
            .bind(document.issue_date)
            .bind(document.due_date)
            .bind(document.expected_date)
            .bind(initial_status().as_str())
            .bind(&document.currency)
            .bind(document.subtotal)
            .bind(document.discount_amount)
            .bind(document.tax_amount)
            .bind(document.shipping_charges)
            .bind(document.total_amount)
            .bind(Decimal::ZERO)
            .bind(document.total_amount)
            .bind(document.source_document_id)
            .bind(&document.payment_terms)
            .bind(&document.notes)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict(anyhow::anyhow!(
                        "Document id '{}' was allocated concurrently",
                        human_id
                    ))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert document: {}", e)),
            })?;

        let rows = Self::insert_lines(&mut tx, header.document_id, header.tenant_id, lines).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        Ok((header, rows))
    }

    async fn insert_lines(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        document_id: Uuid,
        tenant_id: Uuid,
        lines: &[NewLine],
    ) -> Result<Vec<DocumentLine>, AppError> {
        let insert = format!(
            r#"
            INSERT INTO document_lines (
                line_id, document_id, tenant_id, line_number,
                product_id, item_code, description, quantity, unit_of_measure, unit_price,
                discount_percent, tax_rate, discount_amount, tax_amount, line_amount, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {LINE_COLUMNS}
            "#
        );

        let mut rows = Vec::with_capacity(lines.len());
        for line in lines {
            let row = sqlx::query_as::<_, DocumentLine>(&insert)
                .bind(Uuid::new_v4())
                .bind(document_id)
                .bind(tenant_id)
                .bind(line.line_number)
                .bind(line.product_id)
                .bind(&line.item_code)
                .bind(&line.description)
                .bind(line.quantity)
                .bind(&line.unit_of_measure)
                .bind(line.unit_price)
                .bind(line.discount_percent)
                .bind(line.tax_rate)
                .bind(line.discount_amount)
                .bind(line.tax_amount)
                .bind(line.line_amount)
                .bind(&line.notes)
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to insert line: {}", e))
                })?;
            rows.push(row);
        }

        Ok(rows)
    }

    /// Get an active document by human id.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, human_id = %human_id))]
    pub async fn get_document(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
    ) -> Result<Option<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_document"])
            .start_timer();

        let query = format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE tenant_id = $1 AND doc_type = $2 AND human_id = $3 AND is_active = TRUE
            "#
        );

        let document = sqlx::query_as::<_, Document>(&query)
            .bind(tenant_id)
            .bind(kind.as_str())
            .bind(human_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get document: {}", e)))?;

        timer.observe_duration();

        Ok(document)
    }

    /// Get the lines of a document, in line order.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, document_id = %document_id))]
    pub async fn get_lines(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> Result<Vec<DocumentLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_lines"])
            .start_timer();

        let query = format!(
            r#"
            SELECT {LINE_COLUMNS}
            FROM document_lines
            WHERE tenant_id = $1 AND document_id = $2
            ORDER BY line_number
            "#
        );

        let lines = sqlx::query_as::<_, DocumentLine>(&query)
            .bind(tenant_id)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get lines: {}", e)))?;

        timer.observe_duration();

        Ok(lines)
    }

    /// List active documents of a kind for a tenant, newest first.
    #[instrument(skip(self, filter), fields(tenant_id = %tenant_id, doc_type = %kind))]
    pub async fn list_documents(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        filter: &DocumentFilter,
    ) -> Result<Vec<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_documents"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status_str = filter.status.map(|s| s.as_str().to_string());

        let query = format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE tenant_id = $1 AND doc_type = $2 AND is_active = TRUE
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::uuid IS NULL OR counterparty_id = $4)
              AND ($5::varchar IS NULL OR counterparty_name ILIKE '%' || $5 || '%')
              AND ($6::uuid IS NULL OR location_id = $6)
              AND ($7::date IS NULL OR issue_date >= $7)
              AND ($8::date IS NULL OR issue_date <= $8)
            ORDER BY created_utc DESC
            LIMIT $9
            "#
        );

        let documents = sqlx::query_as::<_, Document>(&query)
            .bind(tenant_id)
            .bind(kind.as_str())
            .bind(&status_str)
            .bind(filter.counterparty_id)
            .bind(&filter.counterparty_name)
            .bind(filter.location_id)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list documents: {}", e))
            })?;

        timer.observe_duration();

        Ok(documents)
    }

    /// Patch header fields without touching lines.
    #[instrument(skip(self, patch), fields(tenant_id = %tenant_id, human_id = %human_id))]
    pub async fn update_header(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
        patch: &HeaderPatch,
    ) -> Result<Option<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_header"])
            .start_timer();

        let query = format!(
            r#"
            UPDATE documents
            SET counterparty_id = COALESCE($4, counterparty_id),
                counterparty_name = COALESCE($5, counterparty_name),
                counterparty_code = COALESCE($6, counterparty_code),
                location_id = COALESCE($7, location_id),
                issue_date = COALESCE($8, issue_date),
                due_date = COALESCE($9, due_date),
                expected_date = COALESCE($10, expected_date),
                currency = COALESCE($11, currency),
                shipping_charges = COALESCE($12, shipping_charges),
                payment_terms = COALESCE($13, payment_terms),
                payment_method = COALESCE($14, payment_method),
                payment_date = COALESCE($15, payment_date),
                payment_reference = COALESCE($16, payment_reference),
                notes = COALESCE($17, notes),
                total_amount = COALESCE($18, total_amount),
                balance_due = COALESCE($19, balance_due),
                updated_utc = NOW()
            WHERE tenant_id = $1 AND doc_type = $2 AND human_id = $3 AND is_active = TRUE
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );

        let document = sqlx::query_as::<_, Document>(&query)
            .bind(tenant_id)
            .bind(kind.as_str())
            .bind(human_id)
            .bind(patch.counterparty_id)
            .bind(&patch.counterparty_name)
            .bind(&patch.counterparty_code)
            .bind(patch.location_id)
            .bind(patch.issue_date)
            .bind(patch.due_date)
            .bind(patch.expected_date)
            .bind(&patch.currency)
            .bind(patch.shipping_charges)
            .bind(&patch.payment_terms)
            .bind(&patch.payment_method)
            .bind(patch.payment_date)
            .bind(&patch.payment_reference)
            .bind(&patch.notes)
            .bind(patch.total_amount)
            .bind(patch.balance_due)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update document: {}", e))
            })?;

        timer.observe_duration();

        Ok(document)
    }

    /// Replace every line of a draft document and rewrite its aggregates,
    /// applying any header patch in the same transaction. Old lines are
    /// deleted outright; aggregates are never adjusted incrementally.
    #[instrument(skip(self, patch, totals, lines), fields(tenant_id = %tenant_id, human_id = %human_id))]
    pub async fn replace_lines(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
        patch: &HeaderPatch,
        totals: &DocumentTotals,
        balance_due: Decimal,
        lines: &[NewLine],
    ) -> Result<Option<(Document, Vec<DocumentLine>)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["replace_lines"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let update = format!(
            r#"
            UPDATE documents
            SET counterparty_id = COALESCE($4, counterparty_id),
                counterparty_name = COALESCE($5, counterparty_name),
                counterparty_code = COALESCE($6, counterparty_code),
                location_id = COALESCE($7, location_id),
                issue_date = COALESCE($8, issue_date),
                due_date = COALESCE($9, due_date),
                expected_date = COALESCE($10, expected_date),
                currency = COALESCE($11, currency),
                payment_terms = COALESCE($12, payment_terms),
                notes = COALESCE($13, notes),
                subtotal = $14,
                discount_amount = $15,
                tax_amount = $16,
                shipping_charges = $17,
                total_amount = $18,
                balance_due = $19,
                updated_utc = NOW()
            WHERE tenant_id = $1 AND doc_type = $2 AND human_id = $3
              AND is_active = TRUE AND status = 'draft'
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );

        let header = sqlx::query_as::<_, Document>(&update)
            .bind(tenant_id)
            .bind(kind.as_str())
            .bind(human_id)
            .bind(patch.counterparty_id)
            .bind(&patch.counterparty_name)
            .bind(&patch.counterparty_code)
            .bind(patch.location_id)
            .bind(patch.issue_date)
            .bind(patch.due_date)
            .bind(patch.expected_date)
            .bind(&patch.currency)
            .bind(&patch.payment_terms)
            .bind(&patch.notes)
            .bind(totals.subtotal)
            .bind(totals.discount_amount)
            .bind(totals.tax_amount)
            .bind(totals.shipping_charges)
            .bind(totals.total_amount)
            .bind(balance_due)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update document: {}", e))
            })?;

        let header = match header {
            Some(h) => h,
            None => return Ok(None),
        };

        sqlx::query("DELETE FROM document_lines WHERE tenant_id = $1 AND document_id = $2")
            .bind(tenant_id)
            .bind(header.document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete lines: {}", e))
            })?;

        let rows = Self::insert_lines(&mut tx, header.document_id, tenant_id, lines).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            document_id = %header.document_id,
            line_count = rows.len(),
            "Lines replaced and totals recomputed"
        );

        Ok(Some((header, rows)))
    }

    /// Apply a validated status change with its side-effect fields.
    #[instrument(skip(self, change), fields(tenant_id = %tenant_id, human_id = %human_id, status = %change.status))]
    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
        change: &StatusChange,
    ) -> Result<Option<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_status"])
            .start_timer();

        let query = format!(
            r#"
            UPDATE documents
            SET status = $4,
                carrier = COALESCE($5, carrier),
                tracking_number = COALESCE($6, tracking_number),
                shipped_date = COALESCE($7, shipped_date),
                delivered_date = COALESCE($8, delivered_date),
                received_date = COALESCE($9, received_date),
                updated_utc = NOW()
            WHERE tenant_id = $1 AND doc_type = $2 AND human_id = $3 AND is_active = TRUE
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );

        let document = sqlx::query_as::<_, Document>(&query)
            .bind(tenant_id)
            .bind(kind.as_str())
            .bind(human_id)
            .bind(change.status.as_str())
            .bind(&change.carrier)
            .bind(&change.tracking_number)
            .bind(change.shipped_date)
            .bind(change.delivered_date)
            .bind(change.received_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update status: {}", e))
            })?;

        timer.observe_duration();

        if let Some(ref doc) = document {
            info!(
                document_id = %doc.document_id,
                status = %doc.status,
                "Status updated"
            );
        }

        Ok(document)
    }

    /// Apply a payment update: amount, derived balance, and the (already
    /// validated) status promotion in one statement.
    #[instrument(skip(self, update), fields(tenant_id = %tenant_id, human_id = %human_id))]
    pub async fn update_payment(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Option<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_payment"])
            .start_timer();

        let query = format!(
            r#"
            UPDATE documents
            SET amount_paid = $4,
                balance_due = $5,
                status = $6,
                payment_method = COALESCE($7, payment_method),
                payment_date = COALESCE($8, payment_date),
                payment_reference = COALESCE($9, payment_reference),
                updated_utc = NOW()
            WHERE tenant_id = $1 AND doc_type = $2 AND human_id = $3 AND is_active = TRUE
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );

        let document = sqlx::query_as::<_, Document>(&query)
            .bind(tenant_id)
            .bind(kind.as_str())
            .bind(human_id)
            .bind(update.amount_paid)
            .bind(update.balance_due)
            .bind(update.status.as_str())
            .bind(&update.payment_method)
            .bind(update.payment_date)
            .bind(&update.payment_reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update payment: {}", e))
            })?;

        timer.observe_duration();

        if let Some(ref doc) = document {
            info!(
                document_id = %doc.document_id,
                amount_paid = %doc.amount_paid,
                balance_due = %doc.balance_due,
                status = %doc.status,
                "Payment recorded"
            );
        }

        Ok(document)
    }

    /// Soft-delete a draft document. The status guard in the WHERE clause
    /// closes the race with a concurrent status transition.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, human_id = %human_id))]
    pub async fn soft_delete(
        &self,
        tenant_id: Uuid,
        kind: DocumentKind,
        human_id: &str,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["soft_delete"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET is_active = FALSE, updated_utc = NOW()
            WHERE tenant_id = $1 AND doc_type = $2 AND human_id = $3
              AND is_active = TRUE AND status = 'draft'
            "#,
        )
        .bind(tenant_id)
        .bind(kind.as_str())
        .bind(human_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete document: {}", e)))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(human_id = %human_id, "Draft document soft-deleted");
        }

        Ok(deleted)
    }

    /// Whether an active, non-cancelled document was derived from the source.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, source_document_id = %source_document_id))]
    pub async fn has_active_derived(
        &self,
        tenant_id: Uuid,
        source_document_id: Uuid,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["has_active_derived"])
            .start_timer();

        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT document_id FROM documents
            WHERE tenant_id = $1 AND source_document_id = $2
              AND is_active = TRUE AND status <> 'cancelled'
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(source_document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to check derived documents: {}", e))
        })?;

        timer.observe_duration();

        Ok(row.is_some())
    }
}
