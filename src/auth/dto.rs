use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extract::{email, trimmed},
    users::Role,
};

/// Request body for user registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2))]
    pub name: String,
    #[serde(deserialize_with = "email")]
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    /// Only `teacher` is honored; anything else registers a student.
    pub role: Option<Role>,
}

impl RegisterRequest {
    pub fn granted_role(&self) -> Role {
        match self.role {
            Some(Role::Teacher) => Role::Teacher,
            _ => Role::Student,
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "email")]
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
