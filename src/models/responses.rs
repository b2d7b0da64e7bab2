use serde::{Deserialize, Serialize};
use crate::models::domain::{Decision, DecisionStatus, User};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Public view of a registered user (the password hash is never echoed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Issued bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Result of a swipe
///
/// `status` is `None` when the swipe cleared a previous decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub dog: i64,
    pub status: Option<DecisionStatus>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Decision> for DecisionResponse {
    fn from(decision: Decision) -> Self {
        Self {
            dog: decision.dog_id,
            status: Some(decision.status),
            updated_at: Some(decision.updated_at),
        }
    }
}
