//! Sumsub REST API integration.
//!
//! # Components
//! - `signer`: request signature (`X-App-Access-Sig`) computation
//! - `client`: signed HTTP calls with uniform error mapping
//! - `applicant`: applicant creation, lookup, document upload and access tokens
//! - `multipart`: buffered form encoder, needed because the body is signed
//! - `observer`: optional diagnostic hook over raw responses

pub mod applicant;
pub mod client;
pub mod error;
pub mod multipart;
pub mod observer;
pub mod signer;

pub use applicant::DocumentSubmission;
pub use client::{Credentials, SumsubClient, SUMSUB_BASE_URL};
pub use error::{ApplicantError, SumsubError};
pub use observer::{FileDumpObserver, ResponseObserver};
