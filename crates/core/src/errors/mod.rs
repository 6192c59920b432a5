//! Error types and Result alias for the vendor economy

use crate::types::{ActorId, Gold, TemplateId};
use thiserror::Error;

/// Main error type for the vendor economy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Gold, available: Gold },

    #[error("Insufficient stock for {template}: requested {requested}, available {available}")]
    InsufficientStock {
        template: TemplateId,
        requested: u32,
        available: u32,
    },

    #[error("Budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("Item not eligible for trade: {0}")]
    IneligibleItem(String),

    #[error("No open training session for actor {0}")]
    SessionConflict(ActorId),

    #[error("Vendor access denied: {0}")]
    VendorAccessDenied(String),

    #[error("Catalog corruption: {0}")]
    CatalogCorruption(String),

    #[error("Too many items offered: {offered} exceeds the limit of {limit}")]
    SellLimitExceeded { offered: usize, limit: usize },

    #[error("Training unavailable: {0}")]
    TrainingUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
