use serde::{Deserialize, Serialize};

use crate::error::AppError;

const USERNAME_MAX_CHARS: usize = 32;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=128;

/// Username and password, used both to create an account and to log in.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CredentialsRequest {
    /// 1-32 chars, letters, digits and underscores.
    #[schema(example = "ada_hacks")]
    pub username: String,
    #[schema(example = "correct-horse-battery")]
    pub password: String,
}

pub fn validate_new_account(payload: &CredentialsRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > USERNAME_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Username must be 1-{USERNAME_MAX_CHARS} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    if !PASSWORD_LEN.contains(&payload.password.len()) {
        return Err(AppError::Validation(format!(
            "Password must be {}-{} characters",
            PASSWORD_LEN.start(),
            PASSWORD_LEN.end()
        )));
    }
    Ok(())
}

pub fn validate_login(payload: &CredentialsRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password must not be empty".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AccountResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ada_hacks")]
    pub username: String,
    #[schema(example = "participant")]
    pub role: String,
}

impl From<crate::entity::user::Model> for AccountResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token valid for 7 days.
    pub token: String,
    pub user: AccountResponse,
    #[schema(example = json!(["event:manage"]))]
    pub permissions: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
}
