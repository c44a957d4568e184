//! Backing store implementations.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_store;

pub use connections::DatabaseConfig;
pub use memory::InMemoryBackingStore;

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use postgres_store::PostgresBackingStore;

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
