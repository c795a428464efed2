use anyhow::Context;
use axum::async_trait;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One trading card to guess: its name (the answer) and an image to show.
#[derive(Debug, Clone)]
pub struct Card {
    pub name: String,
    pub image_url: String,
}

/// External source of random cards. Implementations do not retry; a failed
/// fetch is a failed round.
#[async_trait]
pub trait CardProvider: Send + Sync {
    async fn fetch_card(&self) -> anyhow::Result<Card>;
}

/// Pokémon TCG API client. Picks a random single-card page, so each fetch
/// yields an effectively random card.
pub struct PokemonTcg {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

// The card database has roughly this many cards; pages are 1-based.
const MAX_CARD_PAGE: u32 = 17_000;

#[derive(Debug, Deserialize)]
struct CardPage {
    data: Vec<ApiCard>,
}

#[derive(Debug, Deserialize)]
struct ApiCard {
    name: String,
    images: ApiCardImages,
}

#[derive(Debug, Deserialize)]
struct ApiCardImages {
    large: String,
}

impl PokemonTcg {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build card api client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        })
    }
}

#[async_trait]
impl CardProvider for PokemonTcg {
    async fn fetch_card(&self) -> anyhow::Result<Card> {
        let page = rand::thread_rng().gen_range(1..=MAX_CARD_PAGE);
        let mut req = self
            .client
            .get(format!("{}/cards", self.base_url))
            .query(&[("page", page), ("pageSize", 1)]);
        if let Some(key) = &self.api_key {
            req = req.header("X-Api-Key", key);
        }
        let body = req
            .send()
            .await
            .context("card api request")?
            .error_for_status()
            .context("card api status")?
            .json::<CardPage>()
            .await
            .context("card api body")?;
        let card = body
            .data
            .into_iter()
            .next()
            .context("card api returned an empty page")?;
        debug!(name = %card.name, "fetched card");
        Ok(Card {
            name: card.name,
            image_url: card.images.large,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_card_page() {
        let body = r#"{
            "data": [{
                "name": "Pikachu",
                "images": {
                    "small": "https://images.pokemontcg.io/base1/58.png",
                    "large": "https://images.pokemontcg.io/base1/58_hires.png"
                }
            }],
            "page": 42,
            "pageSize": 1
        }"#;
        let page: CardPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "Pikachu");
        assert!(page.data[0].images.large.ends_with("_hires.png"));
    }

    #[test]
    fn empty_page_is_an_error() {
        let page: CardPage = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(page.data.into_iter().next().is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let p = PokemonTcg::new(
            "https://api.pokemontcg.io/v2/",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(p.base_url, "https://api.pokemontcg.io/v2");
    }
}
