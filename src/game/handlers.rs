use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::User,
    error::AppError,
    game::dto::{GuessRequest, GuessResponse, RoundResponse},
    game::service::{self, GuessOutcome},
    session::CurrentSession,
    state::AppState,
};

pub fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/game/round", get(get_round))
        .route("/game/guess", post(submit_guess))
}

/// Starts a round: fetches a random card, binds its name as the answer and
/// returns the image plus the session's standing. The fetch happens before
/// the session is touched, so a provider failure leaves score, feedback and
/// any previous round intact.
#[instrument(skip(state, current))]
pub async fn get_round(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Json<RoundResponse>, AppError> {
    let card = state.cards.fetch_card().await.map_err(|e| {
        error!(error = %e, "card fetch failed");
        AppError::ProviderUnavailable
    })?;

    let mut session = current.session.lock().await;
    let user = User::find_by_username(&state.db, &session.username)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    service::start_round(&mut session, &card);

    Ok(Json(RoundResponse {
        image_url: card.image_url,
        current_score: session.current_score,
        highscore: user.highscore,
        feedback: session.feedback.clone(),
    }))
}

/// Applies a guess. The session lock is held across the whole update, so
/// concurrent submissions on one session are serialized; the highscore
/// promotion is a single conditional UPDATE and needs no such protection.
#[instrument(skip(state, current, payload))]
pub async fn submit_guess(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(payload): Json<GuessRequest>,
) -> Result<Json<GuessResponse>, AppError> {
    let mut session = current.session.lock().await;
    let outcome = service::apply_guess(&mut session, &payload.guess)?;

    let (correct, highscore) = match &outcome {
        GuessOutcome::Correct { score } => {
            let highscore = User::promote_highscore(&state.db, &session.username, *score).await?;
            (true, highscore)
        }
        GuessOutcome::Incorrect { .. } => {
            let user = User::find_by_username(&state.db, &session.username)
                .await?
                .ok_or(AppError::Unauthenticated)?;
            (false, user.highscore)
        }
    };

    Ok(Json(GuessResponse {
        correct,
        current_score: session.current_score,
        highscore,
        feedback: session.feedback.clone(),
    }))
}
