pub mod analysis_backend;
pub mod capture_provider;
pub mod session_delegate;
