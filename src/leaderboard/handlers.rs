use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    error::AppError,
    leaderboard::repo::{self, LeaderboardEntry},
    state::AppState,
};

pub fn leaderboard_routes() -> Router<AppState> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let limit = repo::effective_limit(query.limit, state.config.leaderboard_limit);
    let entries = repo::top_entries(&state.db, limit).await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serialization() {
        let entry = LeaderboardEntry {
            username: "bob".into(),
            highscore: 30,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"username":"bob","highscore":30}"#);
    }
}
