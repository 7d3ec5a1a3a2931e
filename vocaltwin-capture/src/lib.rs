//! Microphone capture backend for vocaltwin, built on cpal.
//!
//! Provides [`CpalMicrophone`], a [`CaptureProvider`] implementation that
//! reads from the platform's default input device and delivers interleaved
//! `f32` buffers to the core session pipeline.
//!
//! [`CaptureProvider`]: vocaltwin_core::traits::capture_provider::CaptureProvider

pub mod microphone;

pub use microphone::CpalMicrophone;
