//! Bazaar Persistence - SQLite storage for catalogs, settings and trade history

pub mod sqlite;

pub use sqlite::Database;
