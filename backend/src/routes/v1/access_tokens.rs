use std::sync::Arc;

use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::{
    sumsub::SumsubClient,
    types::{AppError, ValidatedJson},
};

#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccessTokenBody {
    /// Caller-assigned user reference
    #[validate(length(min = 1, max = 256))]
    pub external_user_id: String,
    /// Verification level; the configured default when omitted
    #[validate(length(min = 1, max = 256))]
    pub level_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResult {
    /// Token for the Sumsub WebSDK
    pub token: String,
    pub external_user_id: String,
    pub level_name: String,
}

/// Issues a Sumsub SDK access token for a user
///
/// # Errors
///
/// - 400 - Invalid JSON body or validation failure
/// - 502 `access_token_failed` - Sumsub rejected the request or was unreachable
#[instrument(skip_all)]
pub async fn create_access_token(
    Extension(sumsub): Extension<Arc<SumsubClient>>,
    ValidatedJson(body): ValidatedJson<AccessTokenBody>,
) -> Result<Json<AccessTokenResult>, AppError> {
    let level_name = body
        .level_name
        .unwrap_or_else(|| sumsub.credentials().level_name.clone());

    let token = sumsub
        .generate_access_token(&body.external_user_id, &level_name)
        .await?;

    Ok(Json(AccessTokenResult {
        token,
        external_user_id: body.external_user_id,
        level_name,
    }))
}
