//! # scholar-postgres
//!
//! PostgreSQL-backed store for scholarstream.
//!
//! ```rust,ignore
//! let store = PgStore::connect(&database_url, 10).await?;
//! store.migrate().await?;
//! let shared: SharedStore = Arc::new(store);
//! ```

mod rows;
pub mod store;

pub use store::PgStore;
