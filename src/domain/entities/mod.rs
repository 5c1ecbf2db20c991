pub mod lead;
pub mod queue_config;
pub mod queue_entry;
pub mod scoring;

pub use lead::*;
pub use queue_config::*;
pub use queue_entry::*;
pub use scoring::*;
