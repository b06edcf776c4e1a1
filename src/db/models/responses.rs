use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Document, User, Verification};

/// General API response status
/// Used to indicate success or failure of operations
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Operation completed successfully
    Success,
    /// Operation encountered an error
    Error,
}

/// Standard error response structure
/// Used when an operation fails
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status will always be Error for this type
    pub status: Status,
    /// Detailed error message explaining what went wrong
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public view of a user, never carries password or reset material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenStatusResponse {
    pub valid: bool,
    pub user_id: String,
    pub role: String,
    pub expires_at: i64,
}

/// Name and email of a user referenced by another record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        DocumentResponse {
            document,
            owner: None,
        }
    }
}

impl From<(Document, String, String)> for DocumentResponse {
    fn from((document, name, email): (Document, String, String)) -> Self {
        DocumentResponse {
            document,
            owner: Some(UserSummary { name, email }),
        }
    }
}

/// Verification with the admin who recorded it
#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationWithVerifier {
    #[serde(flatten)]
    pub verification: Verification,
    pub verifier: UserSummary,
}

impl From<(Verification, String, String)> for VerificationWithVerifier {
    fn from((verification, name, email): (Verification, String, String)) -> Self {
        VerificationWithVerifier {
            verification,
            verifier: UserSummary { name, email },
        }
    }
}

/// Verification with the document it judged
#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationWithDocument {
    #[serde(flatten)]
    pub verification: Verification,
    pub document: Document,
}

/// Current status of a document and the judgment that set it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatusResponse {
    pub document_id: String,
    pub owner_id: String,
    pub status: String,
    pub latest_verification: Option<Verification>,
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub items_per_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, items_per_page: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + items_per_page - 1) / items_per_page
        };
        PaginationMeta {
            total,
            page,
            total_pages,
            items_per_page,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// One page of a listing
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub meta: PaginationMeta,
    pub data: Vec<T>,
}
