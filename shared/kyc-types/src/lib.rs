//! Data model shared between the KYC backend and its tests.
//!
//! The structs mirror the JSON documents exchanged with the Sumsub REST API.
//! Every field the provider may omit is optional so that partial responses
//! still decode.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Verification subject as stored by the provider.
///
/// `id` stays empty until the provider acknowledges creation; an applicant
/// without an id must not be used for document submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Applicant {
    /// Provider-assigned identifier
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection_id: Option<String>,
    /// Caller-assigned stable reference
    #[serde(skip_serializing_if = "String::is_empty")]
    pub external_user_id: String,
    /// Identity data extracted by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    /// Identity data fixed by the caller at creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_info: Option<Info>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub applicant_type: Option<String>,
}

impl Applicant {
    /// Minimal creation request: an external reference and a fixed country.
    #[must_use]
    pub fn for_creation(external_user_id: impl Into<String>, fixed_country: impl Into<String>) -> Self {
        Self {
            external_user_id: external_user_id.into(),
            fixed_info: Some(Info {
                country: Some(fixed_country.into()),
                ..Info::default()
            }),
            ..Self::default()
        }
    }

    /// Whether the provider has acknowledged creation of this applicant.
    #[must_use]
    pub fn is_created(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Structured identity information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name_en: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// ISO 3166-1 alpha-3 country code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub id_docs: Vec<IdDoc>,
}

/// Identity document as returned by the provider after processing.
///
/// Name and date-of-birth fields are only populated once the provider has
/// extracted them from the uploaded image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct IdDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_doc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name_en: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(rename = "dob", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// Metadata part sent alongside the document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdDocMetadata {
    pub id_doc_type: String,
    pub country: String,
}

/// Review block of an applicant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Review {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_since_pending_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_since_queued_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprocessing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_result: Option<ReviewResult>,
    /// Raw provider status, see [`ReviewStatus`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_failure_cnt: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

/// Outcome of a completed review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_answer: Option<String>,
}

/// Provider decision classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, JsonSchema)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewAnswer {
    /// Approved
    Green,
    /// Rejected
    Red,
    /// Any answer this service does not recognise
    #[serde(other)]
    Unrecognized,
}

impl ReviewAnswer {
    /// Parses a raw answer, never coercing unknown values to an approval.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unrecognized)
    }
}

/// Provider review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, JsonSchema)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ReviewStatus {
    Init,
    Pending,
    Prechecked,
    Queued,
    Completed,
    OnHold,
}

/// Request body for `POST /resources/accessTokens/sdk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenRequest {
    pub user_id: String,
    pub level_name: String,
}

/// Response body of the access token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: AccessToken,
}

/// SDK access token issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccessToken {
    pub token: String,
}
