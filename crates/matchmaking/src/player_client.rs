//! HTTP client for the external player service (spec §6, §4.9).
//!
//! Rating and colour-balance lookups degrade gracefully on any error: rating
//! defaults to 1200, colour balance defaults to a coin-flip at the call site.
//! A single shared `reqwest::Client` backs every request, matching the
//! spec's "shared connection-pooled client" requirement.

use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_RATING: i32 = 1200;
pub const RATING_TIMEOUT: Duration = Duration::from_secs(5);
pub const COLOR_BALANCE_TIMEOUT: Duration = Duration::from_secs(3);
pub const COLOR_BALANCE_COMBINED_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Deserialize)]
struct EloResponse {
    elo: i32,
}

#[derive(Debug, Deserialize)]
struct ColorBalanceResponse {
    #[serde(rename = "colorBalance")]
    color_balance: f64,
}

#[derive(Clone)]
pub struct PlayerServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlayerServiceClient {
    pub fn new(base_url: impl Into<String>) -> PlayerServiceClient {
        PlayerServiceClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// `POST /api/v1/player/elo`. Returns `DEFAULT_RATING` on any transport,
    /// timeout, status, or decode error — this lookup never fails pairing.
    pub async fn elo(&self, user_id: &str, game_type: &str) -> i32 {
        let url = format!("{}/api/v1/player/elo", self.base_url);
        let body = serde_json::json!({ "user_id": user_id, "game_type": game_type });
        let result = tokio::time::timeout(RATING_TIMEOUT, self.http.post(&url).json(&body).send()).await;
        match result {
            Ok(Ok(resp)) => resp
                .json::<EloResponse>()
                .await
                .map(|r| r.elo)
                .unwrap_or_else(|err| {
                    tracing::warn!(%err, user_id, "player service returned unparseable elo, defaulting");
                    DEFAULT_RATING
                }),
            Ok(Err(err)) => {
                tracing::warn!(%err, user_id, "player service elo request failed, defaulting");
                DEFAULT_RATING
            }
            Err(_) => {
                tracing::warn!(user_id, "player service elo request timed out, defaulting");
                DEFAULT_RATING
            }
        }
    }

    /// `POST /api/v1/player/color_balance`. Returns `None` on any failure so
    /// the caller can fall back to a coin-flip.
    pub async fn color_balance(&self, user_id: &str, game_type: &str) -> Option<f64> {
        let url = format!("{}/api/v1/player/color_balance", self.base_url);
        let body = serde_json::json!({ "user_id": user_id, "game_type": game_type });
        let result =
            tokio::time::timeout(COLOR_BALANCE_TIMEOUT, self.http.post(&url).json(&body).send()).await;
        match result {
            Ok(Ok(resp)) => resp.json::<ColorBalanceResponse>().await.ok().map(|r| r.color_balance),
            Ok(Err(err)) => {
                tracing::warn!(%err, user_id, "player service color_balance request failed");
                None
            }
            Err(_) => {
                tracing::warn!(user_id, "player service color_balance request timed out");
                None
            }
        }
    }
}
