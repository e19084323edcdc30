//! Operator endpoints: outcome override and round inspection.
//!
//! With no admin token configured the routes answer 404, so a bare
//! deployment exposes no admin surface at all. With one configured,
//! requests must present it as a bearer token.

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use parlor_engine::GameId;
use parlor_types::api::GameKind;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub game: GameKind,
    /// Round the override targets; it must match the game's current
    /// round id, which `GET /admin/rounds/:game` reports.
    #[serde(rename = "gameId")]
    pub game_id: GameId,
    /// Wire spelling of the forced outcome: a bet category for the card
    /// table, a coin side for the toss.
    pub outcome: String,
}

/// Override is best-effort, so refusals are part of the normal reply
/// rather than an error status.
#[derive(Debug, Serialize)]
struct OverrideOutcome {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub async fn set_override(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OverrideRequest>,
) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let result = {
        let mut rooms = state.rooms.lock().unwrap();
        rooms.set_override(req.game, req.game_id, &req.outcome)
    };
    match result {
        Ok(true) => {
            info!(
                game = req.game.as_str(),
                game_id = req.game_id,
                outcome = req.outcome.as_str(),
                "outcome override armed"
            );
            Json(OverrideOutcome {
                accepted: true,
                reason: None,
            })
            .into_response()
        }
        Ok(false) => Json(OverrideOutcome {
            accepted: false,
            reason: Some("no open round with that id".into()),
        })
        .into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(OverrideOutcome {
                accepted: false,
                reason: Some(err.to_string()),
            }),
        )
            .into_response(),
    }
}

pub async fn round_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(game): Path<GameKind>,
) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let snapshot = {
        let rooms = state.rooms.lock().unwrap();
        rooms.admin_round(game)
    };
    match snapshot {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    // Without a configured token the admin surface does not exist.
    let expected = match state.admin_token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => return Err(StatusCode::NOT_FOUND),
    };
    let presented = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match presented {
        Some(token) if token_matches(token, expected) => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Constant-time comparison once the lengths match.
fn token_matches(presented: &str, expected: &str) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use parlor_engine::MemoryLedger;
    use std::sync::Arc;

    fn state_with_token(token: Option<&str>) -> AppState {
        let mut config = GatewayConfig::default();
        config.admin_token = token.map(str::to_string);
        AppState::new(&config, Arc::new(MemoryLedger::new()))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[test]
    fn no_token_configured_hides_the_surface() {
        let state = state_with_token(None);
        assert_eq!(
            authorize(&state, &HeaderMap::new()),
            Err(StatusCode::NOT_FOUND)
        );
        assert_eq!(
            authorize(&state, &bearer("anything")),
            Err(StatusCode::NOT_FOUND)
        );
    }

    #[test]
    fn wrong_or_missing_bearer_is_unauthorized() {
        let state = state_with_token(Some("a-long-enough-admin-token"));
        assert_eq!(
            authorize(&state, &HeaderMap::new()),
            Err(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            authorize(&state, &bearer("wrong-token-entirely-here")),
            Err(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            authorize(&state, &bearer("a-long-enough-admin-token")),
            Ok(())
        );
    }

    #[test]
    fn token_comparison_requires_an_exact_match() {
        assert!(token_matches("abc123", "abc123"));
        assert!(!token_matches("abc124", "abc123"));
        assert!(!token_matches("abc12", "abc123"));
        assert!(!token_matches("", "abc123"));
    }
}
