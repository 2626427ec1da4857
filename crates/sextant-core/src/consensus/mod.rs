pub mod events;
pub mod light_client;
pub mod period;
pub mod signature;
pub mod sync_committee;

pub use events::*;
pub use light_client::*;
pub use period::*;
pub use signature::*;
pub use sync_committee::*;
