use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, PublicUser,
            SignupRequest, UpdateProfileRequest, UserEnvelope,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::ApiError,
    state::AppState,
};

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{3,32}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/login/verify", get(verify))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/password", put(change_password))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if payload.firstname.trim().is_empty()
        || payload.lastname.trim().is_empty()
        || payload.username.trim().is_empty()
        || payload.password.is_empty()
    {
        warn!("signup with missing fields");
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let username = payload.username.trim();
    if !is_valid_username(username) {
        warn!(%username, "signup with invalid username");
        return Err(ApiError::Validation("Invalid username".into()));
    }

    if User::find_by_username(&state.db, username).await?.is_some() {
        warn!(%username, "signup with taken username");
        return Err(ApiError::Validation("User already exists".into()));
    }

    // Hashing happens here and nowhere else on the signup path.
    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        username,
        payload.firstname.trim(),
        payload.lastname.trim(),
        &hash,
    )
    .await?;

    info!(user_id = %user.id, %username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = match User::find_by_username(&state.db, payload.username.trim()).await? {
        Some(u) => u,
        None => {
            warn!(username = %payload.username, "login unknown username");
            return Err(ApiError::Validation("User not found".into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Validation("Invalid password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.username)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: PublicUser::from(&user),
    }))
}

/// Used by clients for auto-login: a valid token resolves back to the full
/// profile, hash excluded.
#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(UserEnvelope { user }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(UserEnvelope { user }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    if payload.firstname.trim().is_empty() || payload.lastname.trim().is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    // Carry current avatar/bio forward when the client omits them.
    let current = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let avatar = payload.avatar.as_deref().unwrap_or(&current.avatar);
    let bio = payload.bio.as_deref().unwrap_or(&current.bio);

    let user = User::update_profile(
        &state.db,
        user_id,
        payload.firstname.trim(),
        payload.lastname.trim(),
        avatar,
        bio,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UserEnvelope { user }))
}

/// The only path that re-hashes an existing user's password.
#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.password.is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let hash = hash_password(&payload.password)?;
    if !User::update_password(&state.db, user_id, &hash).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!(%user_id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password updated successfully".into(),
    }))
}
