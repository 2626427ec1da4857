pub mod beacon;
pub mod execution;
pub mod hex_serde;

pub use beacon::*;
pub use execution::*;
