use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, UpdateProfileRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserRepoError,
        repo_types::{NewUser, Role, User},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the account and returns it with a fresh access token.
pub async fn register(state: &AppState, req: RegisterRequest) -> AppResult<(User, String)> {
    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Please provide name, email and password"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    let existing = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| AppError::server("Error registering user", e))?;
    if existing.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::validation("User already exists"));
    }

    let role = if state.config.admin_key_matches(req.admin_key.as_deref()) {
        Role::Admin
    } else {
        Role::User
    };

    let password_hash =
        hash_password(&req.password).map_err(|e| AppError::server("Error registering user", e))?;

    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            UserRepoError::EmailTaken => AppError::validation("User already exists"),
            UserRepoError::Other(e) => AppError::server("Error registering user", e),
        })?;

    let token = JwtKeys::from_ref(state)
        .sign_access(user.id)
        .map_err(|e| AppError::server("Error registering user", e))?;

    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user registered");
    Ok((user, token))
}

pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<(User, String)> {
    const LOGIN_FAILED: &str = "Server error during login process";
    let email = normalize_email(&req.email);

    let user = match state.users.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::unauthorized("Invalid email or password"));
        }
        Err(e) => return Err(AppError::server(LOGIN_FAILED, e)),
    };

    let ok = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::server(LOGIN_FAILED, e))?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let token = JwtKeys::from_ref(state)
        .sign_access(user.id)
        .map_err(|e| AppError::server(LOGIN_FAILED, e))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((user, token))
}

/// Updates name and/or email. Blank values keep what is stored.
pub async fn update_profile(
    state: &AppState,
    current: &User,
    req: UpdateProfileRequest,
) -> AppResult<User> {
    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let email = req
        .email
        .map(|e| normalize_email(&e))
        .filter(|e| !e.is_empty());

    if let Some(email) = email.as_deref() {
        if !is_valid_email(email) {
            return Err(AppError::validation("Invalid email"));
        }
        if email != current.email {
            let taken = state
                .users
                .find_by_email(email)
                .await
                .map_err(|e| AppError::server("Error updating profile", e))?;
            if taken.is_some_and(|u| u.id != current.id) {
                return Err(AppError::validation("Email already in use"));
            }
        }
    }

    let updated = state
        .users
        .update_profile(current.id, name.as_deref(), email.as_deref())
        .await
        .map_err(|e| match e {
            UserRepoError::EmailTaken => AppError::validation("Email already in use"),
            UserRepoError::Other(e) => AppError::server("Error updating profile", e),
        })?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    info!(user_id = %updated.id, "profile updated");
    Ok(updated)
}

/// Rotates the user's reset nonce and returns a reset token bound to it.
/// Unknown emails yield `None` so callers can answer identically either way.
pub async fn request_password_reset(state: &AppState, email: &str) -> AppResult<Option<String>> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::validation("Please provide an email"));
    }

    let Some(user) = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| AppError::server("Error requesting password reset", e))?
    else {
        info!(email = %email, "password reset for unknown email");
        return Ok(None);
    };

    let nonce = Uuid::new_v4();
    state
        .users
        .set_reset_nonce(user.id, Some(nonce))
        .await
        .map_err(|e| AppError::server("Error requesting password reset", e))?;

    let token = JwtKeys::from_ref(state)
        .sign_reset(user.id, nonce)
        .map_err(|e| AppError::server("Error requesting password reset", e))?;

    info!(user_id = %user.id, "password reset issued");
    Ok(Some(token))
}

pub async fn reset_password(state: &AppState, token: &str, password: &str) -> AppResult<()> {
    const INVALID: &str = "Invalid or expired token";
    if password.is_empty() {
        return Err(AppError::validation("Please provide a new password"));
    }

    let claims = JwtKeys::from_ref(state).verify_reset(token).map_err(|e| {
        warn!(error = %e, "reset token rejected");
        AppError::validation(INVALID)
    })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(|e| AppError::server("Error resetting password", e))?
        .ok_or_else(|| AppError::validation(INVALID))?;

    let Some(nonce) = claims.nonce.filter(|n| user.reset_nonce == Some(*n)) else {
        warn!(user_id = %user.id, "stale reset token");
        return Err(AppError::validation(INVALID));
    };

    let hash =
        hash_password(password).map_err(|e| AppError::server("Error resetting password", e))?;
    // Conditional on the nonce: a concurrent reset with this token gets false.
    let updated = state
        .users
        .update_password(user.id, &hash, nonce)
        .await
        .map_err(|e| AppError::server("Error resetting password", e))?;
    if !updated {
        warn!(user_id = %user.id, "reset token already consumed");
        return Err(AppError::validation(INVALID));
    }

    info!(user_id = %user.id, "password reset");
    Ok(())
}
