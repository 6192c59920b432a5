//! SQLite database management

mod connection;
mod ledger;
mod settings;
mod snapshots;
mod transactions;

pub use connection::Database;
pub use ledger::*;
pub use settings::*;
pub use snapshots::*;
pub use transactions::*;
