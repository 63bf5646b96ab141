//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;
use fiscus_core::auth::{Actor, UserRole};
use fiscus_shared::types::{OrganizationId, UserId};
use fiscus_shared::{AppError, Claims, JwtError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// Valid claims are stored in the request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::from(AppError::Unauthorized(
            "Authorization header with Bearer token is required".to_string(),
        ))
        .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "Rejected bearer token");
            let message = match e {
                JwtError::Expired => "Token has expired",
                _ => "Invalid or malformed token",
            };
            ApiError::from(AppError::Unauthorized(message.to_string())).into_response()
        }
    }
}

/// The authenticated caller: who they are, in which organization, and with
/// which role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    claims: Claims,
    actor: Actor,
}

impl AuthUser {
    /// Returns the acting user.
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.actor.user_id
    }

    /// Returns the organization every request is scoped to.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        OrganizationId::from_uuid(self.claims.organization_id())
    }

    /// Returns the inner claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role: UserRole = claims
            .role
            .parse()
            .map_err(|e: fiscus_core::auth::AuthorizationError| {
                ApiError::from(AppError::Forbidden(e.to_string()))
            })?;
        let actor = Actor::new(UserId::from_uuid(claims.user_id()), role);
        Ok(Self { claims, actor })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().cloned().ok_or_else(|| {
            ApiError::from(AppError::Unauthorized("Authentication required".to_string()))
        })?;
        Self::try_from(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_claims_become_actor() {
        let user = Uuid::now_v7();
        let org = Uuid::now_v7();
        let claims = Claims::new(user, org, "accountant", Utc::now() + Duration::minutes(5));

        let auth = AuthUser::try_from(claims).expect("valid role");
        assert_eq!(auth.user_id().into_inner(), user);
        assert_eq!(auth.organization_id().into_inner(), org);
        assert_eq!(auth.actor().role, UserRole::Accountant);
    }

    #[test]
    fn test_unknown_role_is_forbidden() {
        let claims = Claims::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            "auditor",
            Utc::now() + Duration::minutes(5),
        );
        let err = AuthUser::try_from(claims).expect_err("unknown role");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
