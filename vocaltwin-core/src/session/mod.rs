pub mod analyzer;
pub mod capture;
pub mod controller;
pub mod sink;
pub mod visual;
