//! Service layer: persistence, master-data lookup, the lifecycle engine,
//! cross-document derivation, metrics.

pub mod database;
pub mod documents;
pub mod linker;
pub mod master_data;
pub mod metrics;

pub use database::Database;
pub use documents::DocumentService;
pub use master_data::{MasterDataLookup, PgMasterData};
pub use metrics::{get_metrics, init_metrics};
