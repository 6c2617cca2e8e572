//! Storage backends for metric persistence
//!
//! Every metric the engine sees is handed to each registered backend, in
//! registration order. Backends own their failure handling: a write that fails
//! is logged by the backend and never reaches the engine.
//!
//! ## Backends
//!
//! - **SQLite** (default): one `metrics` table in a local file, connection per write
//! - **In-Memory**: no persistence, for tests or runs without a database
//!
//! ## Usage
//!
//! ```no_run
//! use vigil::storage::{Storage, sqlite::SqliteStorage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = SqliteStorage::new("./history.db").await?;
//!     storage.save(&vigil::Metric::new("cpu_usage", 12.5)).await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::Storage;
pub use error::{StorageError, StorageResult};
pub use schema::MetricRow;
