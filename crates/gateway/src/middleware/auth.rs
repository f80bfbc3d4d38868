//! Authentication middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{AppError, AppResult, JwtConfig};
use domain::UserRole;

use crate::state::AppState;

/// Access token claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Current authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Check if user has admin role.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Name recorded on audit fields such as a course's publisher.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            role: UserRole::from(claims.role.as_str()),
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Check if user has admin privileges.
pub fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Verify an HS256 token and return its claims.
pub fn verify_token(token: &str, config: &JwtConfig) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway_seconds;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        debug!("Rejected access token: {}", e);
        AppError::Unauthorized
    })?;

    Ok(data.claims)
}

/// Authentication middleware that validates JWT tokens.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;

    let claims = verify_token(bearer.token(), &state.config.jwt)?;
    request.extensions_mut().insert(CurrentUser::from(claims));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            leeway_seconds: 0,
        }
    }

    fn token(role: &str, exp_offset: i64, secret: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "coach@example.com".to_string(),
            name: "Ana Admin".to_string(),
            role: role.to_string(),
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_admin_token() {
        let claims = verify_token(&token("admin", 600, "test-secret"), &config()).unwrap();
        let user = CurrentUser::from(claims);

        assert!(user.is_admin());
        assert_eq!(user.display_name(), "Ana Admin");
        assert!(require_admin(&user).is_ok());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let result = verify_token(&token("user", -600, "test-secret"), &config());
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let result = verify_token(&token("admin", 600, "other-secret"), &config());
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_non_admin_is_forbidden() {
        let claims = verify_token(&token("user", 600, "test-secret"), &config()).unwrap();
        let user = CurrentUser::from(claims);

        assert!(matches!(require_admin(&user), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = CurrentUser {
            id: "user-2".to_string(),
            email: "coach@example.com".to_string(),
            name: "  ".to_string(),
            role: UserRole::User,
        };
        assert_eq!(user.display_name(), "coach@example.com");
    }
}
