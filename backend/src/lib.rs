//! KYC backend service: Sumsub applicant onboarding and review callbacks

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

/// HTTP routes
pub mod routes;

/// Server bootstrap
pub mod server;

/// Sumsub REST API client
pub mod sumsub;

/// Configuration, API errors and extractors
pub mod types;

/// Callback verification and review state tracking
pub mod webhook;
