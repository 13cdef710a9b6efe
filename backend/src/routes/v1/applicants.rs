use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path},
    Extension, Json,
};
use kyc_types::{Applicant, IdDoc};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::instrument;

use crate::{
    routes::ekyc::DocumentForm,
    sumsub::SumsubClient,
    types::AppError,
    webhook::{ReviewRecord, ReviewStore},
};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub applicant_id: String,
    pub id_doc: IdDoc,
}

/// Fetches an applicant from Sumsub by its id
///
/// # Errors
///
/// - 404 `applicant_not_found` - Sumsub does not know the applicant
/// - 502 `applicant_lookup_failed` - Any other provider failure
#[instrument(skip(sumsub))]
pub async fn get_applicant(
    Extension(sumsub): Extension<Arc<SumsubClient>>,
    Path(applicant_id): Path<String>,
) -> Result<Json<Applicant>, AppError> {
    Ok(Json(sumsub.get_applicant(&applicant_id).await?))
}

/// Returns the review state tracked from verified callbacks
///
/// # Errors
///
/// - 404 `review_not_found` - No verified callback has been received for the applicant
#[instrument(skip(store))]
pub async fn get_review(
    Extension(store): Extension<Arc<ReviewStore>>,
    Path(applicant_id): Path<String>,
) -> Result<Json<ReviewRecord>, AppError> {
    store
        .get(&applicant_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("review_not_found", "No review recorded for applicant"))
}

/// Attaches a document to an applicant that already exists
///
/// Used to retry the upload after `document_attachment_failed` without
/// creating a second applicant. Expects the multipart fields `idDocType`,
/// `country` and `content`.
///
/// # Errors
///
/// - 400 - Missing field or unparseable form; nothing is sent to the provider
/// - 500 `document_attachment_failed` - The provider rejected the upload
#[instrument(skip(sumsub, multipart))]
pub async fn add_document(
    Extension(sumsub): Extension<Arc<SumsubClient>>,
    Path(applicant_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DocumentResponse>, AppError> {
    let (metadata, content) = DocumentForm::read(multipart).await?.document()?;

    let id_doc = sumsub
        .add_document(&applicant_id, &metadata, &content[..])
        .await?;
    tracing::info!("Document added for applicant {applicant_id}: {id_doc:?}");

    Ok(Json(DocumentResponse {
        applicant_id,
        id_doc,
    }))
}
