use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, MeResponse, PublicUser, RegisterRequest},
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::AppError,
    session::{clear_session_cookie, session_cookie, CurrentSession, MaybeSessionId},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{3,32}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    payload.username = payload.username.trim().to_string();

    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err(AppError::BadRequest("Invalid username".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::BadRequest("Password too short".into()));
    }

    let hash = hash_password(&payload.password, &state.config.hash)?;

    // No pre-check here: the unique constraint decides, so two concurrent
    // registrations of the same name yield exactly one DuplicateUsername.
    let user = User::create(&state.db, &payload.username, &hash).await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<PublicUser>), AppError> {
    payload.username = payload.username.trim().to_string();

    // Missing user and wrong password collapse into the same rejection so
    // responses cannot be used to enumerate usernames.
    let user = match User::find_by_username(&state.db, &payload.username).await? {
        Some(u) => u,
        None => {
            warn!(username = %payload.username, "login unknown username");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(username = %payload.username, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let ttl = state.config.session_ttl();
    let sid = state.sessions.create(user.username.clone(), ttl).await;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(sid, ttl).parse().unwrap(),
    );

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok((headers, Json(PublicUser::from(user))))
}

/// Destroys the session record, taking identity, score, feedback and the
/// pending answer with it. Idempotent: a missing or stale cookie is still
/// a successful logout.
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    MaybeSessionId(sid): MaybeSessionId,
) -> (StatusCode, HeaderMap) {
    if let Some(sid) = sid {
        state.sessions.remove(sid).await;
        info!(session_id = %sid, "session destroyed");
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, clear_session_cookie().parse().unwrap());
    (StatusCode::NO_CONTENT, headers)
}

#[instrument(skip(state, current))]
pub async fn get_me(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Json<MeResponse>, AppError> {
    let session = current.session.lock().await;
    let user = User::find_by_username(&state.db, &session.username)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    Ok(Json(MeResponse {
        username: user.username,
        highscore: user.highscore,
        current_score: session.current_score,
    }))
}
