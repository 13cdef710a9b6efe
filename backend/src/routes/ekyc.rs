use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart,
    },
    http::StatusCode,
    Extension, Json,
};
use kyc_types::{IdDoc, IdDocMetadata};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::instrument;

use crate::{
    sumsub::SumsubClient,
    types::{AppError, SumsubConfig},
};

/// Upper bound for a submission form, document included
pub const MAX_FORM_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EkycResponse {
    /// Human-readable acknowledgment
    pub message: String,
    pub external_user_id: String,
    /// Provider-assigned applicant id
    pub applicant_id: String,
    /// Document as acknowledged by the provider
    pub id_doc: IdDoc,
}

/// Multipart fields of a document upload.
///
/// The whole form is read before anything is sent to the provider, so a
/// missing field never leaves a half-created applicant behind.
#[derive(Debug, Default)]
pub(super) struct DocumentForm {
    pub external_user_id: Option<String>,
    pub id_doc_type: Option<String>,
    pub country: Option<String>,
    pub content: Option<Bytes>,
}

fn form_error(err: &MultipartError) -> AppError {
    tracing::warn!("Error parsing multipart form: {err}");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "Form exceeds the 10 MiB limit",
            false,
        )
    } else {
        AppError::bad_request("invalid_form", "Error parsing form")
    }
}

async fn text(field: Field<'_>) -> Result<Option<String>, AppError> {
    let value = field.text().await.map_err(|e| form_error(&e))?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

impl DocumentForm {
    pub(super) async fn read(
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Self, AppError> {
        let mut multipart = multipart.map_err(|e| {
            tracing::warn!("Rejected multipart request: {e}");
            AppError::bad_request("invalid_form", "Error parsing form")
        })?;

        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| form_error(&e))? {
            let name = field.name().map(ToString::to_string);
            match name.as_deref() {
                Some("externalUserId") => form.external_user_id = text(field).await?,
                Some("idDocType") => form.id_doc_type = text(field).await?,
                Some("country") => form.country = text(field).await?,
                Some("content") => {
                    let content = field.bytes().await.map_err(|e| {
                        tracing::warn!("Error retrieving document file: {e}");
                        AppError::bad_request("invalid_document", "Error retrieving document file")
                    })?;
                    form.content = Some(content);
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Document metadata and content, or a 400 if any of them is missing
    pub(super) fn document(&mut self) -> Result<(IdDocMetadata, Bytes), AppError> {
        let (Some(id_doc_type), Some(country)) = (self.id_doc_type.take(), self.country.take())
        else {
            return Err(AppError::bad_request(
                "missing_parameters",
                "Missing required parameters",
            ));
        };
        let content = self.content.take().ok_or_else(|| {
            AppError::bad_request("invalid_document", "Error retrieving document file")
        })?;

        Ok((
            IdDocMetadata {
                id_doc_type,
                country,
            },
            content,
        ))
    }
}

/// Creates an applicant and attaches an identity document to it
///
/// Expects a multipart form with the text fields `externalUserId`,
/// `idDocType` and `country`, and the document image as `content`.
///
/// # Errors
///
/// - 400 `missing_parameters` / `invalid_document` / `invalid_form` - Nothing was sent to the provider
/// - 500 `applicant_creation_failed` - No applicant was created
/// - 500 `document_attachment_failed` - The applicant exists without a document;
///   `applicantId` is set and the upload can be retried alone
#[instrument(skip_all)]
pub async fn process_ekyc(
    Extension(sumsub): Extension<Arc<SumsubClient>>,
    Extension(config): Extension<Arc<SumsubConfig>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EkycResponse>, AppError> {
    let mut form = DocumentForm::read(multipart).await?;

    let external_user_id = form.external_user_id.take().ok_or_else(|| {
        AppError::bad_request("missing_parameters", "Missing required parameters")
    })?;
    let (metadata, content) = form.document()?;

    let submission = sumsub
        .submit_document(
            &config.level_name,
            &external_user_id,
            &config.fixed_country,
            &metadata,
            &content[..],
        )
        .await?;

    Ok(Json(EkycResponse {
        message: format!(
            "EKYC process initiated for user {external_user_id}. Check /verify for final status."
        ),
        external_user_id,
        applicant_id: submission.applicant.id,
        id_doc: submission.id_doc,
    }))
}
