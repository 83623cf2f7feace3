use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{jwt::JwtKeys, repo_types::User};
use crate::{error::AppError, state::AppState};

/// Verified caller. The user row is re-read on every request so role and
/// profile changes apply immediately.
pub struct AuthUser(pub User);

/// Verified caller that passed the role gate.
pub struct AdminUser(pub User);

pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Not authorized, no token"))?;

    // Expect "Bearer <token>"
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Not authorized, no token"))
}

pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        warn!(user_id = %user.id, "admin route denied");
        Err(AppError::forbidden("Not authorized as an admin"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::unauthorized("Not authorized, token failed")
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|e| AppError::server("Server error", e))?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for missing user");
                AppError::unauthorized("Not authorized, user not found")
            })?;

        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        require_admin(&user)?;
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::{NewUser, Role};
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/profile");
        if let Some(h) = header {
            builder = builder.header("Authorization", h);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn seeded(state: &AppState, role: Role) -> User {
        state
            .users
            .create(NewUser {
                name: "A".into(),
                email: format!("{}@x.com", uuid::Uuid::new_v4()),
                password_hash: "hash".into(),
                role,
            })
            .await
            .unwrap()
    }

    #[test]
    fn bearer_token_requires_scheme() {
        assert!(bearer_token(&parts_with(None)).is_err());
        assert!(bearer_token(&parts_with(Some("Basic abc"))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer "))).is_err());
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))).unwrap(), "abc");
    }

    #[tokio::test]
    async fn auth_user_resolves_current_record() {
        let state = AppState::fake();
        let user = seeded(&state, Role::User).await;
        let token = JwtKeys::from_ref(&state).sign_access(user.id).unwrap();

        let mut parts = parts_with(Some(&format!("Bearer {token}")));
        let AuthUser(found) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .ok()
            .unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn deleted_user_token_is_unauthorized() {
        let state = AppState::fake();
        let user = seeded(&state, Role::User).await;
        let token = JwtKeys::from_ref(&state).sign_access(user.id).unwrap();
        state.users.delete(user.id).await.unwrap();

        let mut parts = parts_with(Some(&format!("Bearer {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn role_gate_forbids_plain_users() {
        let state = AppState::fake();
        let user = seeded(&state, Role::User).await;
        let admin = seeded(&state, Role::Admin).await;
        let keys = JwtKeys::from_ref(&state);

        let mut parts = parts_with(Some(&format!("Bearer {}", keys.sign_access(user.id).unwrap())));
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden(_)));

        let mut parts = parts_with(Some(&format!("Bearer {}", keys.sign_access(admin.id).unwrap())));
        assert!(AdminUser::from_request_parts(&mut parts, &state).await.is_ok());
    }
}
