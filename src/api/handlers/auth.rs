//! Authentication endpoints: login, registration, profile, CSRF token.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use once_cell::sync::Lazy;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::extract::{parse_body, CurrentUser, Json};
use crate::api::middleware::auth::issue_token;
use crate::api::middleware::csrf;
use crate::api::router::AppState;
use crate::domain::enums::Role;
use crate::domain::errors::AppError;
use crate::validation::{resources, validate};

/// Public user profile; the password hash never leaves this module.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, sqlx::FromRow)]
struct UserAuthRow {
    id: Uuid,
    email: String,
    name: String,
    role: Role,
    password_hash: String,
}

#[derive(Deserialize)]
struct LoginInput {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterInput {
    email: String,
    password: String,
    name: String,
    role: Role,
}

/// POST /auth/login
///
/// Unknown email and wrong password produce the identical response, so
/// the endpoint cannot be used to enumerate accounts.
pub async fn login(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::LOGIN, &mut body)?;
    let input: LoginInput = parse_body(body)?;

    // Emails are stored lower-cased; validation lower-cases the input, so
    // the lookup is effectively case-insensitive.
    let user: Option<UserAuthRow> = sqlx::query_as(
        "SELECT id, email, name, role, password_hash FROM users WHERE email = $1",
    )
    .bind(&input.email)
    .fetch_optional(&state.pool)
    .await?;

    let user = check_credentials(user, &input.password)?;

    let token = issue_token(user.id, &user.email, user.role, &state.config.jwt_secret)?;

    Ok(axum::Json(json!({
        "success": true,
        "token": token,
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.name,
            "role": user.role,
        },
    })))
}

/// POST /auth/register (admin only)
pub async fn register(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    validate(resources::REGISTER, &mut body)?;
    let input: RegisterInput = parse_body(body)?;

    let password_hash = hash_password(&input.password)?;

    // A duplicate email surfaces as the 409 CONFLICT translation of the
    // unique constraint.
    let user: UserProfile = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, role, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, name, role
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&input.email)
    .bind(&input.name)
    .bind(input.role.as_str())
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, axum::Json(user)))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let profile: Option<UserProfile> =
        sqlx::query_as("SELECT id, email, name, role FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_optional(&state.pool)
            .await?;

    profile
        .map(axum::Json)
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// GET /csrf-token
///
/// Returns the current double-submit token, minting one when the cookie
/// is absent so a client can bootstrap before its first mutation.
pub async fn csrf_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = csrf::cookie_value(&headers, csrf::CSRF_COOKIE) {
        return axum::Json(json!({ "csrfToken": token })).into_response();
    }

    let token = csrf::generate_token();
    let mut response = axum::Json(json!({ "csrfToken": token })).into_response();
    if let Some(value) =
        csrf::set_cookie_value(&token, state.config.environment.is_production())
    {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// Hash verified against when no account matches the email, so the
/// unknown-email path costs one Argon2 verification like every other
/// failed login.
static ENUMERATION_GUARD_HASH: Lazy<String> =
    Lazy::new(|| hash_password("enumeration-guard").unwrap_or_default());

/// Decide a login attempt. Unknown email and wrong password produce the
/// same error, after the same amount of hashing work.
fn check_credentials(user: Option<UserAuthRow>, password: &str) -> Result<UserAuthRow, AppError> {
    match user {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        Some(_) => Err(AppError::unauthorized("Invalid credentials")),
        None => {
            let _ = verify_password(password, &ENUMERATION_GUARD_HASH);
            Err(AppError::unauthorized("Invalid credentials"))
        }
    }
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}
