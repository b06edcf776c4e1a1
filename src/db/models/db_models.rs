use crate::errors::ApiError;
use crate::schema::{documents, users, verifications};
use crate::services::storage::StoredFile;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{DocumentMetadataParams, UploadFields};

#[derive(Clone, Debug, Insertable, Identifiable, Queryable, AsChangeset)]
#[diesel(table_name = users, primary_key(id))]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn new(email: &str, password_hash: String, name: &str, role: Role) -> Self {
        let now = Utc::now().naive_utc();
        User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            name: name.trim().to_string(),
            role: role.into(),
            is_active: true,
            reset_token: None,
            reset_token_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_reset_token_valid(&self, token: &str, now: NaiveDateTime) -> bool {
        match (&self.reset_token, self.reset_token_expires) {
            (Some(stored), Some(expires)) => stored == token && now <= expires,
            _ => false,
        }
    }
}

#[derive(
    Clone, Debug, Serialize, Deserialize, Insertable, Identifiable, Queryable, AsChangeset,
)]
#[diesel(table_name = documents, primary_key(id))]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub document_type: String,
    pub hash: String,
    pub file_name: Option<String>,
    #[serde(skip_serializing)]
    pub storage_key: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Document {
    /// Document registered from client-side metadata only
    pub fn from_metadata(user_id: &str, params: &DocumentMetadataParams) -> Self {
        let now = Utc::now().naive_utc();
        Document {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: params.title.trim().to_string(),
            description: params.description.clone().unwrap_or_default(),
            document_type: params.document_type.clone().unwrap_or_default(),
            hash: params.hash.trim().to_lowercase(),
            file_name: None,
            storage_key: None,
            mime_type: None,
            file_size: None,
            status: DocumentStatus::Pending.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Document backed by a file written to storage
    pub fn from_upload(user_id: &str, fields: &UploadFields, stored: StoredFile) -> Self {
        let now = Utc::now().naive_utc();
        let title = fields
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&stored.original_name)
            .to_string();

        Document {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title,
            description: fields.description.clone().unwrap_or_default(),
            document_type: fields.document_type.clone().unwrap_or_default(),
            hash: stored.sha256,
            file_name: Some(stored.original_name),
            storage_key: Some(stored.storage_key),
            mime_type: stored.mime_type,
            file_size: Some(stored.size as i64),
            status: DocumentStatus::Pending.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(
    Clone, Debug, Serialize, Deserialize, Insertable, Identifiable, Queryable, AsChangeset,
)]
#[diesel(table_name = verifications, primary_key(id))]
pub struct Verification {
    pub id: String,
    pub document_id: String,
    pub verified_by: String,
    pub status: String,
    pub comments: Option<String>,
    pub verification_date: NaiveDateTime,
}

impl Verification {
    pub fn new(
        document_id: &str,
        verified_by: &str,
        status: VerificationStatus,
        comments: Option<String>,
    ) -> Self {
        Verification {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            verified_by: verified_by.to_string(),
            status: status.into(),
            comments: comments.filter(|c| !c.trim().is_empty()),
            verification_date: Utc::now().naive_utc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::User => "user".to_string(),
            Role::Admin => "admin".to_string(),
        }
    }
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ApiError::BadRequest(format!("Invalid role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Verified,
    Rejected,
}

impl From<DocumentStatus> for String {
    fn from(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Pending => "pending".to_string(),
            DocumentStatus::Verified => "verified".to_string(),
            DocumentStatus::Rejected => "rejected".to_string(),
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(DocumentStatus::Pending),
            "verified" => Ok(DocumentStatus::Verified),
            "rejected" => Ok(DocumentStatus::Rejected),
            other => Err(ApiError::BadRequest(format!(
                "Invalid document status: {other}"
            ))),
        }
    }
}

/// Outcome an admin can record for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Rejected,
}

impl From<VerificationStatus> for String {
    fn from(status: VerificationStatus) -> Self {
        DocumentStatus::from(status).into()
    }
}

impl From<VerificationStatus> for DocumentStatus {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Verified => DocumentStatus::Verified,
            VerificationStatus::Rejected => DocumentStatus::Rejected,
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "verified" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(ApiError::BadRequest(format!(
                "Invalid verification status: {other}"
            ))),
        }
    }
}
