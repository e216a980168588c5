//! Infrastructure layer: settings, persistence, and the inventory ledger
//! service that ties the domain rules to storage.

pub mod dashboard;
pub mod ledger;
pub mod seed;
pub mod settings;
pub mod store;

pub use dashboard::DashboardStats;
pub use ledger::{InventoryLedger, LedgerError, RecordedMovement};
pub use settings::{
    AppConfig, LogSettings, ServerSettings, SettingsError, StoreBackend, StoreSettings,
};
pub use store::{InMemoryStore, PostgresStore, StoreError, StoreResult, Storage};
