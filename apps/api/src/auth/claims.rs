use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Role;
use crate::errors::AppError;

/// Fixed `iss` value stamped on, and required of, every token.
pub const ISSUER: &str = "api project";

/// How long an issued token stays valid, in seconds.
pub const TOKEN_VALIDITY_SECS: i64 = 50 * 60;

/// Claims carried inside a signed identity token.
///
/// Once returned from `TokenService::verify` these are trusted for the
/// lifetime of the request that presented the token, and no longer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    /// Decimal string form of the numeric user id.
    pub sub: String,
    /// Unix seconds.
    pub iat: i64,
    /// Unix seconds.
    pub exp: i64,
    #[serde(rename = "roles")]
    pub role: Role,
}

impl Claims {
    pub fn new(subject_id: i64, role: Role, issued_at: DateTime<Utc>) -> Self {
        Self {
            iss: ISSUER.to_string(),
            sub: subject_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(TOKEN_VALIDITY_SECS)).timestamp(),
            role,
        }
    }

    /// Numeric id of the acting user.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub.parse().map_err(|_| {
            tracing::warn!(sub = %self.sub, "Token subject is not a numeric user id");
            AppError::Unauthorized
        })
    }

    /// Business-level role assertion for handlers. Unlike the gate, this is
    /// allowed to tell the caller what it needed.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role != role {
            return Err(AppError::Forbidden(format!(
                "Only {role} users are allowed to perform this action"
            )));
        }
        Ok(())
    }
}

/// Handlers behind a `RoleGateLayer` take `Claims` as an extractor.
/// A handler mounted without the gate gets a 401 instead of a panic.
#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::TimeZone;

    #[test]
    fn test_new_sets_fifty_minute_window() {
        let issued = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let claims = Claims::new(42, Role::Applicant, issued);
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, TOKEN_VALIDITY_SECS);
        assert_eq!(TOKEN_VALIDITY_SECS, 3000);
    }

    #[test]
    fn test_role_travels_under_roles_key() {
        let claims = Claims::new(7, Role::Admin, Utc::now());
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["roles"], "admin");
        assert!(value.get("role").is_none());
    }

    #[test]
    fn test_user_id_rejects_non_numeric_subject() {
        let mut claims = Claims::new(7, Role::Admin, Utc::now());
        assert_eq!(claims.user_id().unwrap(), 7);
        claims.sub = "seven".to_string();
        assert!(matches!(claims.user_id(), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_require_role() {
        let claims = Claims::new(7, Role::Admin, Utc::now());
        assert!(claims.require_role(Role::Admin).is_ok());
        let err = claims.require_role(Role::Applicant).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref msg) if msg.contains("applicant")));
    }

    #[tokio::test]
    async fn test_extractor_requires_claims_in_extensions() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let missing = Claims::from_request_parts(&mut parts, &()).await;
        assert!(matches!(missing, Err(AppError::Unauthorized)));

        let claims = Claims::new(3, Role::Applicant, Utc::now());
        parts.extensions.insert(claims.clone());
        let found = Claims::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, claims);
    }
}
