//! Applicant lifecycle on top of [`SumsubClient`]: create the applicant, then
//! attach an identity document to it.

use kyc_types::{AccessTokenRequest, AccessTokenResponse, Applicant, IdDoc, IdDocMetadata};
use reqwest::Method;
use tokio::io::AsyncRead;

use super::{
    client::{SumsubClient, CONTENT_TYPE_JSON},
    error::{ApplicantError, SumsubError},
    multipart::MultipartBody,
};

/// Successful outcome of the combined create-then-attach flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSubmission {
    pub applicant: Applicant,
    pub id_doc: IdDoc,
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

impl SumsubClient {
    /// Creates an applicant at the provider for `external_user_id`.
    ///
    /// The returned applicant carries the provider-assigned id.
    ///
    /// # Errors
    ///
    /// `ApplicantError::CreationFailed` wrapping the provider or marshalling error
    pub async fn create_applicant(
        &self,
        level_name: &str,
        external_user_id: &str,
        fixed_country: &str,
    ) -> Result<Applicant, ApplicantError> {
        let applicant = Applicant::for_creation(external_user_id, fixed_country);
        let body = serde_json::to_vec(&applicant)
            .map_err(|e| ApplicantError::CreationFailed(e.into()))?;

        let path = format!("/resources/applicants?levelName={}", encode(level_name));
        let response = self
            .call(Method::POST, &path, CONTENT_TYPE_JSON, Some(body))
            .await
            .map_err(ApplicantError::CreationFailed)?;
        self.observe("createApplicant", &response).await;

        let created: Applicant = serde_json::from_slice(&response)
            .map_err(|e| ApplicantError::CreationFailed(e.into()))?;
        if !created.is_created() {
            return Err(ApplicantError::MissingApplicantId);
        }

        Ok(created)
    }

    /// Fetches an applicant by its provider-assigned id.
    ///
    /// # Errors
    ///
    /// `ApplicantError::LookupFailed` wrapping the provider or marshalling error
    pub async fn get_applicant(&self, applicant_id: &str) -> Result<Applicant, ApplicantError> {
        let lookup_failed = |source: SumsubError| ApplicantError::LookupFailed {
            applicant_id: applicant_id.to_string(),
            source,
        };

        let path = format!("/resources/applicants/{}/one", encode(applicant_id));
        let response = self
            .call(Method::GET, &path, CONTENT_TYPE_JSON, None)
            .await
            .map_err(lookup_failed)?;
        self.observe("getApplicant", &response).await;

        serde_json::from_slice(&response).map_err(|e| lookup_failed(e.into()))
    }

    /// Uploads an identity document for an existing applicant.
    ///
    /// `content` is drained exactly once into the multipart body and dropped
    /// before this returns, on every path.
    ///
    /// # Errors
    ///
    /// - `ApplicantError::MissingApplicantId` - `applicant_id` is empty; nothing is sent
    /// - `ApplicantError::AttachmentFailed` - Reading the content or the provider call failed
    pub async fn add_document<R>(
        &self,
        applicant_id: &str,
        metadata: &IdDocMetadata,
        content: R,
    ) -> Result<IdDoc, ApplicantError>
    where
        R: AsyncRead + Unpin + Send,
    {
        if applicant_id.is_empty() {
            return Err(ApplicantError::MissingApplicantId);
        }
        let attachment_failed = |source: SumsubError| ApplicantError::AttachmentFailed {
            applicant_id: applicant_id.to_string(),
            source,
        };

        let metadata_json = serde_json::to_vec(metadata).map_err(|e| attachment_failed(e.into()))?;

        let mut form = MultipartBody::new();
        form.file_part("content", "document", content)
            .await
            .map_err(|e| attachment_failed(SumsubError::Content(e)))?;
        form.json_part("metadata", &metadata_json);
        let (content_type, body) = form.finish();

        let path = format!("/resources/applicants/{}/info/idDoc", encode(applicant_id));
        let response = self
            .call(Method::POST, &path, &content_type, Some(body))
            .await
            .map_err(attachment_failed)?;
        self.observe("addDocument", &response).await;

        serde_json::from_slice(&response).map_err(|e| attachment_failed(e.into()))
    }

    /// Creates an applicant and attaches one document to it.
    ///
    /// Attachment is only attempted after creation succeeded. When attachment
    /// fails the applicant already exists at the provider without a document;
    /// the error then carries its id so that only the attachment is retried.
    ///
    /// # Errors
    ///
    /// - `ApplicantError::CreationFailed` - Nothing was created
    /// - `ApplicantError::AttachmentFailed` - The applicant exists without a document
    pub async fn submit_document<R>(
        &self,
        level_name: &str,
        external_user_id: &str,
        fixed_country: &str,
        metadata: &IdDocMetadata,
        content: R,
    ) -> Result<DocumentSubmission, ApplicantError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let applicant = self
            .create_applicant(level_name, external_user_id, fixed_country)
            .await?;
        tracing::info!(
            "Applicant created with ID: {} for user {external_user_id}",
            applicant.id
        );

        let id_doc = self.add_document(&applicant.id, metadata, content).await?;
        tracing::info!("Document added for applicant {}: {id_doc:?}", applicant.id);

        Ok(DocumentSubmission { applicant, id_doc })
    }

    /// Issues an SDK access token for `user_id` at `level_name`.
    ///
    /// # Errors
    ///
    /// `ApplicantError::AccessTokenFailed` wrapping the provider or marshalling error
    pub async fn generate_access_token(
        &self,
        user_id: &str,
        level_name: &str,
    ) -> Result<String, ApplicantError> {
        let request = AccessTokenRequest {
            user_id: user_id.to_string(),
            level_name: level_name.to_string(),
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| ApplicantError::AccessTokenFailed(e.into()))?;

        let response = self
            .call(
                Method::POST,
                "/resources/accessTokens/sdk",
                CONTENT_TYPE_JSON,
                Some(body),
            )
            .await
            .map_err(ApplicantError::AccessTokenFailed)?;
        self.observe("generateAccessToken", &response).await;

        let token: AccessTokenResponse = serde_json::from_slice(&response)
            .map_err(|e| ApplicantError::AccessTokenFailed(e.into()))?;
        Ok(token.access_token.token)
    }
}
