use super::not_found_as;
use crate::api::extract::{Json, Path, Query};
use crate::auth::{ensure_owner_or_admin, AdminClaims, Claims};
use crate::db::models::{
    Document, DocumentMetadataParams, DocumentResponse, DocumentStatus, ListParams,
    MessageResponse, PaginatedResponse, PaginationMeta, UpdateStatusParams, UploadFields,
};
use crate::db::redis::document_status_key;
use crate::db::DbClient;
use crate::errors::{ApiError, ErrorMessages};
use crate::logging::audit;
use crate::monitoring::record_document;
use crate::services::storage::Storage;
use crate::validation::{validate_hash, validate_title};
use crate::Result;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

/// Handler for multipart document uploads
///
/// # Endpoint: POST /api/documents/upload
///
/// Accepts a `file` part plus optional `title`, `description` and
/// `document_type` text parts. The stored bytes are hashed with SHA-256.
pub(crate) async fn upload_document(
    claims: Claims,
    State(db): State<DbClient>,
    State(storage): State<Storage>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>)> {
    let mut fields = UploadFields::default();
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);

                let mut data = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    if data.len() + chunk.len() > storage.max_bytes() {
                        return Err(ApiError::PayloadTooLarge(format!(
                            "File exceeds the maximum size of {} bytes",
                            storage.max_bytes()
                        )));
                    }
                    data.extend_from_slice(&chunk);
                }
                file = Some((file_name, content_type, data));
            }
            "title" => fields.title = Some(field.text().await?),
            "description" => fields.description = Some(field.text().await?),
            "document_type" => fields.document_type = Some(field.text().await?),
            other => tracing::debug!("Ignoring unexpected multipart field {}", other),
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    if file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }
    if let Some(title) = fields.title.as_deref().filter(|t| !t.trim().is_empty()) {
        validate_title(title).map_err(ApiError::BadRequest)?;
    }

    let stored = storage
        .save(&claims.sub, &file_name, content_type.as_deref(), &data)
        .await?;
    let storage_key = stored.storage_key.clone();
    let document = Document::from_upload(&claims.sub, &fields, stored);

    if let Err(e) = db.insert_document(&document).await {
        // Don't leave orphaned bytes behind
        if let Err(cleanup) = storage.delete(&storage_key).await {
            tracing::warn!("Failed to remove orphaned upload {}: {}", storage_key, cleanup);
        }
        return Err(e);
    }

    audit(
        &claims.sub,
        "upload_document",
        &document.id,
        Some(&json!({ "hash": document.hash, "file_size": document.file_size })),
    );
    record_document("uploaded");

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

/// Handler registering a document hashed on the client
///
/// # Endpoint: POST /api/documents
pub(crate) async fn create_document(
    claims: Claims,
    State(db): State<DbClient>,
    Json(payload): Json<DocumentMetadataParams>,
) -> Result<(StatusCode, Json<DocumentResponse>)> {
    if payload.title.trim().is_empty() || payload.hash.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Title and hash are required".to_string(),
        ));
    }
    validate_title(&payload.title).map_err(ApiError::BadRequest)?;
    validate_hash(&payload.hash).map_err(ApiError::BadRequest)?;

    let document = Document::from_metadata(&claims.sub, &payload);
    db.insert_document(&document).await?;

    audit(
        &claims.sub,
        "create_document",
        &document.id,
        Some(&json!({ "hash": document.hash })),
    );
    record_document("registered");

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

/// # Endpoint: GET /api/documents
pub(crate) async fn list_documents(
    AdminClaims(_admin): AdminClaims,
    State(db): State<DbClient>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<DocumentResponse>>> {
    let status = match params.status.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(s.parse::<DocumentStatus>()?),
        _ => None,
    };

    let (page, per_page) = params.normalized();
    let (rows, total) = db.list_documents(status, per_page, params.offset()).await?;

    Ok(Json(PaginatedResponse {
        meta: PaginationMeta::new(total, page, per_page),
        data: rows.into_iter().map(DocumentResponse::from).collect(),
    }))
}

/// # Endpoint: GET /api/documents/user/me
pub(crate) async fn list_my_documents(
    claims: Claims,
    State(db): State<DbClient>,
) -> Result<Json<Vec<Document>>> {
    let documents = db.list_documents_for_user(&claims.sub).await?;
    Ok(Json(documents))
}

/// # Endpoint: GET /api/documents/:id
pub(crate) async fn get_document(
    claims: Claims,
    State(db): State<DbClient>,
    Path(document_id): Path<String>,
) -> Result<Json<DocumentResponse>> {
    let row = db
        .get_document_with_owner(&document_id)
        .await
        .map_err(not_found_as(ErrorMessages::DocumentNotFound))?;
    ensure_owner_or_admin(&row.0.user_id, &claims)?;

    Ok(Json(DocumentResponse::from(row)))
}

/// Handler returning the stored bytes of an uploaded document
///
/// # Endpoint: GET /api/documents/:id/download
pub(crate) async fn download_document(
    claims: Claims,
    State(db): State<DbClient>,
    State(storage): State<Storage>,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse> {
    let document = db
        .get_document(&document_id)
        .await
        .map_err(not_found_as(ErrorMessages::DocumentNotFound))?;
    ensure_owner_or_admin(&document.user_id, &claims)?;

    let storage_key = document.storage_key.as_deref().ok_or_else(|| {
        ApiError::NotFound("No stored file for this document".to_string())
    })?;
    let bytes = storage.read(storage_key).await?;

    let content_type = document
        .mime_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        document.file_name.as_deref().unwrap_or("document")
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// # Endpoint: PATCH /api/documents/:id/status
pub(crate) async fn update_document_status(
    AdminClaims(admin): AdminClaims,
    State(db): State<DbClient>,
    Path(document_id): Path<String>,
    Json(payload): Json<UpdateStatusParams>,
) -> Result<Json<DocumentResponse>> {
    let status: DocumentStatus = payload.status.trim().parse()?;

    let document = db
        .update_document_status(&document_id, status)
        .await
        .map_err(not_found_as(ErrorMessages::DocumentNotFound))?;
    db.invalidate_cache(&document_status_key(&document.id)).await;

    audit(
        &admin.sub,
        "update_document_status",
        &document.id,
        Some(&json!({ "status": document.status })),
    );
    record_document(document.status.clone());

    Ok(Json(DocumentResponse::from(document)))
}

/// Handler deleting a document with its verifications and stored file
///
/// # Endpoint: DELETE /api/documents/:id
pub(crate) async fn delete_document(
    claims: Claims,
    State(db): State<DbClient>,
    State(storage): State<Storage>,
    Path(document_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let document = db
        .get_document(&document_id)
        .await
        .map_err(not_found_as(ErrorMessages::DocumentNotFound))?;
    ensure_owner_or_admin(&document.user_id, &claims)?;

    if db.delete_document(&document.id).await? == 0 {
        return Err(ApiError::NotFound(
            ErrorMessages::DocumentNotFound.to_string(),
        ));
    }
    if let Some(storage_key) = &document.storage_key {
        if let Err(e) = storage.delete(storage_key).await {
            tracing::error!("Failed to remove stored file {}: {}", storage_key, e);
        }
    }
    db.invalidate_cache(&document_status_key(&document.id)).await;

    audit(&claims.sub, "delete_document", &document.id, None);

    Ok(Json(MessageResponse::new("Document deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{bearer, request, send, test_router};
    use crate::db::models::Role;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::json;

    #[tokio::test]
    async fn test_my_documents_requires_token() {
        let (router, _dir) = test_router();
        let (status, _) = send(router, request("GET", "/api/documents/user/me", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_documents_requires_admin() {
        let (router, _dir) = test_router();
        let token = bearer(Role::User);
        let (status, _) = send(router, request("GET", "/api/documents", Some(&token), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_documents_rejects_unknown_status_filter() {
        let (router, _dir) = test_router();
        let token = bearer(Role::Admin);
        let req = request("GET", "/api/documents?status=approved", Some(&token), None);
        let (status, body) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid document status: approved");
    }

    #[tokio::test]
    async fn test_create_document_validates_hash() {
        let (router, _dir) = test_router();
        let token = bearer(Role::User);
        let req = request(
            "POST",
            "/api/documents",
            Some(&token),
            Some(json!({ "title": "Deed", "hash": "not-hex" })),
        );
        let (status, body) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Hash must be hex encoded");
    }

    #[tokio::test]
    async fn test_create_document_requires_title() {
        let (router, _dir) = test_router();
        let token = bearer(Role::User);
        let req = request(
            "POST",
            "/api/documents",
            Some(&token),
            Some(json!({ "hash": "abcdef" })),
        );
        let (status, body) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title and hash are required");
    }

    #[tokio::test]
    async fn test_status_patch_requires_admin() {
        let (router, _dir) = test_router();
        let token = bearer(Role::User);
        let req = request(
            "PATCH",
            "/api/documents/doc-1/status",
            Some(&token),
            Some(json!({ "status": "verified" })),
        );
        let (status, _) = send(router, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_status_patch_rejects_unknown_status() {
        let (router, _dir) = test_router();
        let token = bearer(Role::Admin);
        let req = request(
            "PATCH",
            "/api/documents/doc-1/status",
            Some(&token),
            Some(json!({ "status": "approved" })),
        );
        let (status, _) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_requires_token() {
        let (router, _dir) = test_router();
        let (status, _) = send(router, request("DELETE", "/api/documents/doc-1", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    fn multipart_request(token: Option<&str>, file_name: &str, content: &str) -> Request<Body> {
        let boundary = "veritrust-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\n\
             Contract\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );

        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/documents/upload")
            .header("x-forwarded-for", "198.51.100.23")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_upload_requires_token() {
        let (router, _dir) = test_router();
        let (status, _) = send(router, multipart_request(None, "deed.pdf", "%PDF")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_extension() {
        let (router, dir) = test_router();
        let token = bearer(Role::User);
        let (status, body) = send(router, multipart_request(Some(&token), "run.exe", "MZ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "File type not allowed. Allowed types: pdf, png, jpg, jpeg"
        );
        // Nothing was written
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_file_name() {
        let (router, _dir) = test_router();
        let token = bearer(Role::User);
        let (status, body) = send(router, multipart_request(Some(&token), "", "data")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file selected");
    }

    fn stored_files(root: &std::path::Path) -> usize {
        std::fs::read_dir(root)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .map(|path| if path.is_dir() { stored_files(&path) } else { 1 })
            .sum()
    }

    #[tokio::test]
    async fn test_upload_over_size_cap_is_413() {
        let (router, dir) = test_router();
        let token = bearer(Role::User);
        let content = "a".repeat(1024 * 1024 + 1);
        let (status, body) = send(router, multipart_request(Some(&token), "big.pdf", &content)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "File exceeds the maximum size of 1048576 bytes");
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_upload_removes_file_when_insert_fails() {
        let (router, dir) = test_router();
        let token = bearer(Role::User);
        let (status, body) = send(router, multipart_request(Some(&token), "deed.pdf", "%PDF-1.7")).await;
        // The database is unreachable, so the insert fails after the file is written
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(stored_files(dir.path()), 0);
    }
}
