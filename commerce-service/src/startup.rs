//! Application startup and lifecycle management.

use crate::config::CommerceConfig;
use crate::handlers::{bills, health, invoices, orders, purchase_orders};
use crate::services::{init_metrics, Database, DocumentService, PgMasterData};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: CommerceConfig,
    pub db: Arc<Database>,
    pub documents: DocumentService,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: CommerceConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build without running migrations. Use in tests when the harness has
    /// already applied them.
    pub async fn build_without_migrations(config: CommerceConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: CommerceConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let db = Arc::new(db);
        let master_data = Arc::new(PgMasterData::new(db.pool().clone()));
        let documents = DocumentService::new(db.clone(), master_data);

        let state = AppState {
            config: config.clone(),
            db,
            documents,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "commerce-service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health::health_check))
            .route("/ready", get(health::readiness_check))
            .route("/metrics", get(health::metrics_handler))
            .route(
                "/orders",
                post(orders::create_order).get(orders::list_orders),
            )
            .route(
                "/orders/:id",
                get(orders::get_order)
                    .put(orders::update_order)
                    .delete(orders::delete_order),
            )
            .route("/orders/:id/status", patch(orders::update_order_status))
            .route(
                "/purchase-orders",
                post(purchase_orders::create_purchase_order)
                    .get(purchase_orders::list_purchase_orders),
            )
            .route(
                "/purchase-orders/:id",
                get(purchase_orders::get_purchase_order)
                    .put(purchase_orders::update_purchase_order)
                    .delete(purchase_orders::delete_purchase_order),
            )
            .route(
                "/purchase-orders/:id/status",
                patch(purchase_orders::update_purchase_order_status),
            )
            .route(
                "/invoices",
                post(invoices::create_invoice).get(invoices::list_invoices),
            )
            .route(
                "/invoices/from-order",
                post(invoices::create_invoice_from_order),
            )
            .route(
                "/invoices/:id",
                get(invoices::get_invoice)
                    .put(invoices::update_invoice)
                    .delete(invoices::delete_invoice),
            )
            .route(
                "/invoices/:id/status",
                patch(invoices::update_invoice_status),
            )
            .route(
                "/invoices/:id/payment",
                patch(invoices::update_invoice_payment),
            )
            .route("/bills", post(bills::create_bill).get(bills::list_bills))
            .route(
                "/bills/from-purchase-order",
                post(bills::create_bill_from_purchase_order),
            )
            .route(
                "/bills/:id",
                get(bills::get_bill)
                    .put(bills::update_bill)
                    .delete(bills::delete_bill),
            )
            .route("/bills/:id/status", patch(bills::update_bill_status))
            .route("/bills/:id/payment", patch(bills::update_bill_payment))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(metrics_middleware))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = Self::router(self.state.clone());

        tracing::info!(
            service = "commerce-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
