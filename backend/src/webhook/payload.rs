//! Strict decoding of verified callback bodies.
//!
//! Only the fields this service acts on are decoded. Any document that does
//! not carry a string `applicantId` decodes as [`WebhookPayload::Other`] and is
//! acknowledged without effect.

use kyc_types::{ReviewAnswer, ReviewStatus};
use serde::{de::IgnoredAny, Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WebhookPayload {
    /// Event about a known applicant
    Applicant(ApplicantEvent),
    /// Any other well-formed JSON document
    Other(IgnoredAny),
}

impl WebhookPayload {
    /// Decodes a verified callback body.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if `body` is not valid JSON
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantEvent {
    pub applicant_id: String,
    /// Event type, e.g. `applicantReviewed`
    #[serde(default, rename = "type", deserialize_with = "string_or_none")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub external_user_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub review_status: Option<String>,
    #[serde(default)]
    pub review_result: Option<ReviewResultField>,
}

/// Side fields never reject the event; a value that is not a string reads as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(value) => Some(value),
        Lenient::Other(_) => None,
    })
}

/// The nested `reviewResult` object, when it carries a string answer
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReviewResultField {
    Answered {
        #[serde(rename = "reviewAnswer")]
        review_answer: String,
    },
    Unrecognized(IgnoredAny),
}

impl ApplicantEvent {
    /// Raw review answer, if the event carries one
    #[must_use]
    pub fn raw_review_answer(&self) -> Option<&str> {
        match &self.review_result {
            Some(ReviewResultField::Answered { review_answer }) => Some(review_answer),
            _ => None,
        }
    }

    #[must_use]
    pub fn review_answer(&self) -> Option<ReviewAnswer> {
        self.raw_review_answer().map(ReviewAnswer::from_raw)
    }

    /// Review status, if present and recognised
    #[must_use]
    pub fn review_status(&self) -> Option<ReviewStatus> {
        self.review_status.as_deref().and_then(|s| s.parse().ok())
    }
}
