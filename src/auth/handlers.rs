use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, PublicUser, SigninRequest, SignupRequest},
        jwt::{AuthUser, JwtKeys},
        password,
        repo::User,
    },
    error::{ApiError, ApiResult, MessageResponse},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Absent and blank fields are the same failure to the caller.
fn required(field: Option<String>) -> Result<String, ApiError> {
    match field {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation("All fields are required.".into())),
    }
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let name = required(payload.name)?.trim().to_string();
    let email = required(payload.email)?.trim().to_lowercase();
    let password = required(payload.password)?;

    if name.chars().count() < 2 {
        warn!("name too short");
        return Err(ApiError::Validation(
            "Name must be at least 2 characters long.".into(),
        ));
    }

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email address.".into()));
    }

    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation(
            "Password must be at least 8 characters long.".into(),
        ));
    }

    // Hashing is CPU-bound; keep it off the async workers.
    let cost = state.config.hash_cost;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    // No pre-flight lookup: the unique index decides duplicates atomically.
    let user = User::create(&state.db, &name, &email, &hash).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Account created successfully!".into(),
            token,
            user: PublicUser {
                name: user.name,
                email: user.email,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = required(payload.email)?.trim().to_lowercase();
    let password = required(payload.password)?;

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            // Reported exactly like a wrong password.
            warn!(email = %email, "signin unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let secret = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || password::verify_password(&password, &secret))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .unwrap_or_else(|e| {
            // A malformed stored secret is a failed verification, not a crash.
            error!(error = %e, user_id = %user.id, "stored secret did not parse");
            false
        });

    if !ok {
        warn!(email = %user.email, user_id = %user.id, "signin invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user signed in");
    Ok(Json(AuthResponse {
        message: "Signed in successfully.".into(),
        token,
        user: PublicUser {
            name: user.name,
            email: user.email,
        },
    }))
}

/// Stateless: the client discards its token.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out.".into(),
    })
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(PublicUser {
        name: user.name,
        email: user.email,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plausible_addresses() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(required(None).is_err());
        assert!(required(Some("".into())).is_err());
        assert!(required(Some("   ".into())).is_err());
        assert_eq!(required(Some("ok".into())).unwrap(), "ok");
    }
}
