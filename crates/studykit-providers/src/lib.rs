//! LLM provider layer for StudyKit.
//!
//! Every study tool turns its input into a prompt and hands it to the
//! [`Dispatcher`], which walks the configured providers in priority order
//! until one returns usable text.
//!
//! # Architecture
//!
//! - [`registry`] — static specs for the supported providers + runtime descriptors
//! - [`shape`] — request bodies and response extraction per wire format
//! - [`classify`] — failure kinds and HTTP error classification
//! - [`tracker::AvailabilityTracker`] — per-provider usage, rate windows, cooldowns
//! - [`http_provider::HttpProvider`] — one HTTP client per descriptor
//! - [`dispatcher::Dispatcher`] — ordered failover across providers

pub mod classify;
pub mod dispatcher;
pub mod error;
pub mod http_provider;
pub mod registry;
pub mod shape;
pub mod tracker;
pub mod traits;

// Re-export main types for convenience
pub use classify::{classify_failure, FailureKind};
pub use dispatcher::{Completion, DispatchOptions, Dispatcher, ProviderStatus};
pub use error::{DispatchError, ProviderFailure};
pub use http_provider::{build_http_client, HttpProvider};
pub use registry::{build_descriptors, ProviderDescriptor, ProviderSpec, PROVIDERS};
pub use shape::{RequestParams, RequestShape};
pub use tracker::{AvailabilityTracker, Outcome, ProviderUsage};
pub use traits::CompletionProvider;
