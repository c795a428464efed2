use serde::{Deserialize, Serialize};

/// Request body for submitting a guess.
#[derive(Debug, Deserialize)]
pub struct GuessRequest {
    pub guess: String,
}

/// A fresh round: the card image to show and where the session stands.
/// The card's name stays server-side.
#[derive(Debug, Serialize)]
pub struct RoundResponse {
    pub image_url: String,
    pub current_score: i64,
    pub highscore: i64,
    pub feedback: Option<String>,
}

/// Result of a guess.
#[derive(Debug, Serialize)]
pub struct GuessResponse {
    pub correct: bool,
    pub current_score: i64,
    pub highscore: i64,
    pub feedback: Option<String>,
}
