use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub highscore: i64,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            highscore: user.highscore,
        }
    }
}

/// Response for `GET /me`: the persisted record plus the session score.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub highscore: i64,
    pub current_score: i64,
}
