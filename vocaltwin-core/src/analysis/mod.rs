pub mod client;
pub mod fallback;
