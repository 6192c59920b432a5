//! Event queue feeding vendors one event at a time

mod queue;

pub use queue::{EventQueue, VendorEvent};
