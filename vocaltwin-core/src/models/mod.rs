pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod metrics;
pub mod state;
