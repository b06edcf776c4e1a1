use super::not_found_as;
use crate::api::extract::{Json, Path};
use crate::auth::{ensure_owner_or_admin, AdminClaims, Claims};
use crate::db::models::{
    CreateVerificationParams, DocumentStatusResponse, Verification, VerificationStatus,
    VerificationWithDocument, VerificationWithVerifier,
};
use crate::db::redis::document_status_key;
use crate::db::DbClient;
use crate::errors::{ApiError, ErrorMessages};
use crate::logging::audit;
use crate::monitoring::{record_cache_lookup, record_verification};
use crate::Result;
use axum::{extract::State, http::StatusCode};
use serde_json::json;

/// Handler recording an admin's judgment on a document
///
/// # Endpoint: POST /api/verifications
///
/// The verification row and the document's new status are written in one
/// transaction.
pub(crate) async fn create_verification(
    AdminClaims(admin): AdminClaims,
    State(db): State<DbClient>,
    Json(payload): Json<CreateVerificationParams>,
) -> Result<(StatusCode, Json<Verification>)> {
    if payload.document_id.trim().is_empty() || payload.status.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Document ID and status are required".to_string(),
        ));
    }
    let status: VerificationStatus = payload.status.trim().parse()?;

    let verification = Verification::new(
        payload.document_id.trim(),
        &admin.sub,
        status,
        payload.comments,
    );
    let verification = db.record_verification(verification).await?;
    db.invalidate_cache(&document_status_key(&verification.document_id))
        .await;

    audit(
        &admin.sub,
        "create_verification",
        &verification.document_id,
        Some(&json!({ "verification_id": verification.id, "status": verification.status })),
    );
    record_verification(verification.status.clone());

    Ok((StatusCode::CREATED, Json(verification)))
}

/// # Endpoint: GET /api/verifications/document/:documentId
pub(crate) async fn list_document_verifications(
    claims: Claims,
    State(db): State<DbClient>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<VerificationWithVerifier>>> {
    let document = db
        .get_document(&document_id)
        .await
        .map_err(not_found_as(ErrorMessages::DocumentNotFound))?;
    ensure_owner_or_admin(&document.user_id, &claims)?;

    let rows = db.list_verifications_for_document(&document.id).await?;
    Ok(Json(
        rows.into_iter().map(VerificationWithVerifier::from).collect(),
    ))
}

/// # Endpoint: GET /api/verifications/verifier/:verifierId
pub(crate) async fn list_verifier_verifications(
    AdminClaims(_admin): AdminClaims,
    State(db): State<DbClient>,
    Path(verifier_id): Path<String>,
) -> Result<Json<Vec<VerificationWithDocument>>> {
    let rows = db.list_verifications_by_verifier(&verifier_id).await?;
    Ok(Json(rows))
}

/// Handler for a document's current status, served from Redis when cached
///
/// # Endpoint: GET /api/verifications/status/:documentId
pub(crate) async fn get_document_status(
    claims: Claims,
    State(db): State<DbClient>,
    Path(document_id): Path<String>,
) -> Result<Json<DocumentStatusResponse>> {
    let cache_key = document_status_key(&document_id);

    match db.get_cache(&cache_key).await {
        Ok(cached) => match serde_json::from_str::<DocumentStatusResponse>(&cached) {
            Ok(summary) => {
                ensure_owner_or_admin(&summary.owner_id, &claims)?;
                record_cache_lookup(true);
                tracing::debug!("Cache hit for {}", cache_key);
                return Ok(Json(summary));
            }
            Err(e) => tracing::warn!("Discarding malformed cache entry {}: {}", cache_key, e),
        },
        Err(ApiError::NotFound(_)) => tracing::debug!("Cache miss for {}", cache_key),
        Err(e) => tracing::warn!("Status cache unavailable: {}", e),
    }
    record_cache_lookup(false);

    let document = db
        .get_document(&document_id)
        .await
        .map_err(not_found_as(ErrorMessages::DocumentNotFound))?;
    ensure_owner_or_admin(&document.user_id, &claims)?;

    let summary = DocumentStatusResponse {
        document_id: document.id,
        owner_id: document.user_id,
        status: document.status,
        latest_verification: db.latest_verification(&document_id).await?,
    };

    match serde_json::to_string(&summary) {
        Ok(value) => {
            if let Err(e) = db.set_cache(&cache_key, &value).await {
                tracing::warn!("Failed to cache status for {}: {}", document_id, e);
            }
        }
        Err(e) => tracing::warn!("Failed to serialize status for {}: {}", document_id, e),
    }

    Ok(Json(summary))
}
