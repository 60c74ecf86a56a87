//! Editing session workflow.
//!
//! This crate provides:
//! - [`SessionState`], the upload → detect → process → complete state machine
//! - Selection of detected people ([`selection`])
//! - The [`EditingBackend`] seam and its HTTP implementation
//! - [`Workflow`], which drives a session against a backend and reports to a
//!   [`SessionObserver`]

pub mod backend;
pub mod error;
pub mod selection;
pub mod state;
pub mod workflow;

pub use backend::{BackendError, DetectionOutcome, EditingBackend, HttpBackend, RemovalOutcome};
pub use error::{RequestKind, SessionError, SessionResult};
pub use state::{DetectionTicket, RemovalTicket, SessionState};
pub use workflow::{NoopObserver, SessionObserver, Workflow};
