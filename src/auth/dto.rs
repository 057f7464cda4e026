use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: User,
}

impl LoginResponse {
    pub fn success(user: User) -> Self {
        Self {
            message: "Login success",
            user,
        }
    }
}

/// Body of every non-200 response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
