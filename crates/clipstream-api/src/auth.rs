use std::sync::Arc;

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{Json, extract::State};
use axum::http::StatusCode;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use clipstream_db::Database;
use clipstream_types::Error;
use clipstream_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};

use crate::error::{ApiError, ApiResult};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(Error::invalid("username must be 3-32 characters").into());
    }
    if req.password.len() < 8 {
        return Err(Error::invalid("password must be at least 8 characters").into());
    }
    if req.full_name.trim().is_empty() {
        return Err(Error::invalid("full name is required").into());
    }

    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(Error::Conflict(format!("username {} is taken", req.username)).into());
    }

    // Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError(Error::Unavailable(format!("password hashing failed: {e}"))))?
        .to_string();

    let user_id = Uuid::new_v4();
    state.db.create_user(
        &user_id.to_string(),
        &req.username,
        req.full_name.trim(),
        req.avatar_url.as_deref().unwrap_or(""),
        &password_hash,
    )?;

    let token = create_token(&state.jwt_secret, user_id, &req.username)
        .map_err(|e| ApiError(Error::Unavailable(format!("token creation failed: {e}"))))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .get_user_by_username(&req.username)?
        .ok_or(ApiError(Error::Unauthenticated))?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError(Error::Unavailable(format!("corrupt password hash: {e}"))))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError(Error::Unauthenticated))?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError(Error::Unavailable(format!("corrupt user id: {e}"))))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)
        .map_err(|e| ApiError(Error::Unavailable(format!("token creation failed: {e}"))))?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
