pub mod error;
pub mod network;
pub mod platform;
pub mod snapshot;
pub mod task;
pub mod usage;
