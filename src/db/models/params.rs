use serde::{Deserialize, Serialize};

pub const PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Registration payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterParams {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordParams {
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPasswordParams {
    pub token: String,
    pub new_password: String,
}

/// Fields an admin may change on a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserParams {
    pub name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Metadata for a document whose file was hashed client-side
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadataParams {
    pub title: String,
    pub description: Option<String>,
    pub document_type: Option<String>,
    pub hash: String,
}

/// Text fields accompanying a multipart upload
#[derive(Debug, Clone, Default)]
pub struct UploadFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub document_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateStatusParams {
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateVerificationParams {
    #[serde(rename = "documentId", alias = "document_id")]
    pub document_id: String,
    pub status: String,
    pub comments: Option<String>,
}

/// Query string for paginated listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

impl ListParams {
    /// Returns a (page, per_page) pair clamped to valid bounds
    pub fn normalized(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(PER_PAGE).clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }

    pub fn offset(&self) -> i64 {
        let (page, per_page) = self.normalized();
        (page - 1) * per_page
    }
}
