use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub username: String,
    pub highscore: i64,
}

/// Top users by highscore. Ties break by username ascending so repeated
/// calls over unchanged data return the same order. Read-only.
pub async fn top_entries(db: &PgPool, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
    if limit <= 0 {
        return Ok(Vec::new());
    }
    let entries = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT username, highscore
        FROM users
        ORDER BY highscore DESC, username ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(entries)
}

/// Clamps a client-requested limit to the configured maximum. Absent means
/// "the configured default".
pub fn effective_limit(requested: Option<i64>, configured_max: i64) -> i64 {
    let max = configured_max.max(0);
    requested.unwrap_or(max).clamp(0, max)
}
