//! Data models for the vendor economy

mod skill;
mod stock;
mod trade;
mod training;
mod vendor;
mod wallet;

pub use skill::*;
pub use stock::*;
pub use trade::*;
pub use training::*;
pub use vendor::*;
pub use wallet::*;
