use serde::Deserialize;

/// Argon2 cost parameters. Defaults follow the argon2 crate's
/// recommended parameters (19 MiB, 2 iterations).
#[derive(Debug, Clone, Deserialize)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session_ttl_seconds: i64,
    pub leaderboard_limit: i64,
    pub card_api_url: String,
    pub card_api_key: Option<String>,
    pub card_fetch_timeout_seconds: u64,
    pub hash: HashConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session_ttl_seconds = std::env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60 * 60 * 24);
        let leaderboard_limit = std::env::var("LEADERBOARD_LIMIT")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(9);
        let card_api_url = std::env::var("CARD_API_URL")
            .unwrap_or_else(|_| "https://api.pokemontcg.io/v2".into());
        let card_api_key = std::env::var("CARD_API_KEY").ok();
        let card_fetch_timeout_seconds = std::env::var("CARD_FETCH_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);
        let hash = HashConfig {
            memory_kib: std::env::var("ARGON2_MEMORY_KIB")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(19_456),
            iterations: std::env::var("ARGON2_ITERATIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(2),
        };
        Ok(Self {
            database_url,
            session_ttl_seconds,
            leaderboard_limit,
            card_api_url,
            card_api_key,
            card_fetch_timeout_seconds,
            hash,
        })
    }

    pub fn session_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.session_ttl_seconds)
    }
}
