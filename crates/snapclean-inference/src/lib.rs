//! Clients for the hosted person detection and removal provider.
//!
//! This crate provides:
//! - An [`InferenceProvider`] trait with a live HTTP implementation and a
//!   deterministic placeholder implementation
//! - Normalization of the box formats used by different detectors
//! - [`DetectionClient`] and [`RemovalClient`], which fall back to placeholder
//!   data whenever the live provider fails

pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod live;
pub mod provider;
pub mod types;

pub use client::{Detection, DetectionClient, Removal, RemovalClient};
pub use config::InferenceConfig;
pub use error::{InferenceError, InferenceResult};
pub use fallback::FallbackProvider;
pub use live::LiveProvider;
pub use provider::{provider_from_config, InferenceProvider};
