use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_core::{Identity, Role};

use crate::error::AppError;
use crate::state::AppState;

const NO_TOKEN: &str = "Not authorized, no token provided";
const BAD_TOKEN: &str = "Not authorized, token failed";

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims issued by the account service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
    pub exp: usize,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        let identity = Identity::new(claims.sub, claims.email, claims.role);
        match claims.name {
            Some(name) => identity.with_name(name),
            None => identity,
        }
    }
}

pub fn decode_identity(token: &str, secret: &str) -> Result<Identity, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::AuthenticationError(BAD_TOKEN.to_string())
    })?;

    Ok(token_data.claims.into())
}

/// `Ok(None)` when no Authorization header was sent at all.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or_else(|| AppError::AuthenticationError(BAD_TOKEN.to_string()))
}

// ============================================================================
// Extractors
// ============================================================================

/// A verified caller; rejects with 401 when the token is missing or invalid.
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::AuthenticationError(NO_TOKEN.to_string()))?;
        decode_identity(token, &state.auth.secret).map(CurrentUser)
    }
}

/// A caller who may be a guest. A token that is sent must still verify.
pub struct MaybeUser(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => decode_identity(token, &state.auth.secret).map(|id| MaybeUser(Some(id))),
            None => Ok(MaybeUser(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(role: Role, exp_offset: i64) -> String {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "ada@example.com".into(),
            name: Some("Ada".into()),
            role,
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let identity = decode_identity(&token(Role::Admin, 3600), SECRET).unwrap();
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_reject_expired_or_foreign_token() {
        assert!(matches!(
            decode_identity(&token(Role::User, -3600), SECRET),
            Err(AppError::AuthenticationError(_))
        ));
        assert!(matches!(
            decode_identity(&token(Role::User, 3600), "other-secret"),
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let (mut parts, _) = axum::http::Request::builder().body(()).unwrap().into_parts();
        assert!(bearer_token(&parts).unwrap().is_none());

        parts.headers.insert("authorization", "Basic abc".parse().unwrap());
        assert!(bearer_token(&parts).is_err());

        parts.headers.insert("authorization", "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&parts).unwrap(), Some("abc.def"));
    }
}
