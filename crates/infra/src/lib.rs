//! Infrastructure layer: storage backends, configuration and order orchestration.
//!
//! Postgres components take an injected `PgPool`; nothing here holds a global
//! connection. `InMemoryStore` implements the same traits for tests and dev.

pub mod adjuster;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod in_memory;
pub mod orders;
pub mod service;


pub use adjuster::PostgresInventoryAdjuster;
pub use catalog::{CatalogProvider, LowStockProduct, PostgresCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, DatabaseConfig, EngineConfig};
pub use error::{OrderWriteError, StoreError, WriteStep};
pub use in_memory::InMemoryStore;
pub use orders::{
    OrderHeaderRecord, OrderHistoryReader, OrderLineRecord, OrderWriter, PostgresOrderHistory,
    PostgresOrderWriter,
};
pub use service::{OrderService, PlaceOrderError, PlacedOrder};
