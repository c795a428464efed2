use sqlx::PgPool;

use crate::auth::repo_types::User;
use crate::error::AppError;

impl User {
    /// Insert a new user with highscore 0. Uniqueness rides on the
    /// `username` constraint; a concurrent duplicate insert loses at the
    /// database, not in a check-then-insert window here.
    pub async fn create(
        db: &PgPool,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, highscore, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateUsername
            }
            _ => AppError::StorageUnavailable(e),
        })
    }

    /// Find a user by username (case-sensitive, the key).
    pub async fn find_by_username(db: &PgPool, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, highscore, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Raise the stored highscore to `candidate` if it is higher, in one
    /// conditional update. Two sessions promoting concurrently can never
    /// overwrite a higher score with a lower one.
    pub async fn promote_highscore(
        db: &PgPool,
        username: &str,
        candidate: i64,
    ) -> Result<i64, AppError> {
        let highscore = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET highscore = GREATEST(highscore, $2)
            WHERE username = $1
            RETURNING highscore
            "#,
        )
        .bind(username)
        .bind(candidate)
        .fetch_one(db)
        .await?;
        Ok(highscore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn create_twice_yields_exactly_one_duplicate(pool: PgPool) {
        let first = User::create(&pool, "alice", "hash-1").await.unwrap();
        assert_eq!(first.username, "alice");
        assert_eq!(first.highscore, 0);

        let err = User::create(&pool, "alice", "hash-2").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));

        // the surviving record is the first registration's
        let user = User::find_by_username(&pool, "alice")
            .await
            .unwrap()
            .expect("alice should exist");
        assert_eq!(user.password_hash, "hash-1");
    }

    #[sqlx::test]
    async fn concurrent_registrations_of_one_name(pool: PgPool) {
        let (a, b) = tokio::join!(
            User::create(&pool, "bob", "hash-a"),
            User::create(&pool, "bob", "hash-b"),
        );
        // exactly one wins, whichever order the inserts land in
        assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
        let err = if a.is_err() {
            a.unwrap_err()
        } else {
            b.unwrap_err()
        };
        assert!(matches!(err, AppError::DuplicateUsername));
    }

    #[sqlx::test]
    async fn usernames_are_case_sensitive_keys(pool: PgPool) {
        User::create(&pool, "alice", "hash-1").await.unwrap();
        User::create(&pool, "Alice", "hash-2").await.unwrap();
        assert!(User::find_by_username(&pool, "ALICE")
            .await
            .unwrap()
            .is_none());
    }

    #[sqlx::test]
    async fn promotion_is_monotonic_in_either_order(pool: PgPool) {
        User::create(&pool, "alice", "hash").await.unwrap();
        assert_eq!(
            User::promote_highscore(&pool, "alice", 3).await.unwrap(),
            3
        );
        assert_eq!(
            User::promote_highscore(&pool, "alice", 7).await.unwrap(),
            7
        );

        User::create(&pool, "bob", "hash").await.unwrap();
        assert_eq!(User::promote_highscore(&pool, "bob", 7).await.unwrap(), 7);
        // the lower candidate is a no-op, not an overwrite
        assert_eq!(User::promote_highscore(&pool, "bob", 3).await.unwrap(), 7);

        let bob = User::find_by_username(&pool, "bob")
            .await
            .unwrap()
            .expect("bob should exist");
        assert_eq!(bob.highscore, 7);
    }
}
