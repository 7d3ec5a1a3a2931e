pub mod resample;
pub mod spectrum;
pub mod tap;
