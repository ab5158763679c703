// Spoolstock - Vendor Registry Library
// Exposes the vendor store for the CLI, the API server, and tests

pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ids;
pub mod store;
pub mod telemetry;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError, DbType, LogFormat};
pub use db::{setup_database, verify_count, SqliteVendorStore};
pub use entities::{Field, NewVendor, Vendor, VendorFilter, VendorId, VendorPatch, VendorRegistry};
pub use error::{Result, StoreError};
pub use ids::{IdGenerator, SequentialIds};
pub use store::VendorStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
