//! Identity token issuance and verification.
//!
//! Tokens are RS256 JWTs. The service is the only holder of the keypair and
//! keeps no per-token state, so an issued token stays usable until `exp`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;

use super::{Claims, Role, ISSUER};

const ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token service misconfigured: {0}")]
    Configuration(String),

    #[error("Token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("not authorized to perform this action")]
    Forbidden { role: Role, required: Role },
}

/// How a token's role is compared with the role a route requires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleCheck {
    /// The token's role must equal the required role.
    #[default]
    Exact,
    /// Compatibility mode: only `applicant` tokens are compared, so an
    /// `admin` token passes every gate.
    ApplicantOnly,
}

impl RoleCheck {
    fn permits(self, role: Role, required: Role) -> bool {
        match self {
            RoleCheck::Exact => role == required,
            RoleCheck::ApplicantOnly => role != Role::Applicant || role == required,
        }
    }
}

impl FromStr for RoleCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(RoleCheck::Exact),
            "applicant_only" => Ok(RoleCheck::ApplicantOnly),
            other => Err(format!(
                "unknown role check '{other}' (expected 'exact' or 'applicant_only')"
            )),
        }
    }
}

/// Sole authority for producing and validating identity tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    role_check: RoleCheck,
}

impl TokenService {
    /// Builds the service from PEM-encoded RSA keys.
    /// Empty or unparseable key material is a configuration fault.
    pub fn new(public_pem: &[u8], private_pem: &[u8]) -> Result<Self, AuthError> {
        if public_pem.is_empty() || private_pem.is_empty() {
            return Err(AuthError::Configuration(
                "private key, public key cannot be empty".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| AuthError::Configuration(format!("invalid RSA private key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| AuthError::Configuration(format!("invalid RSA public key: {e}")))?;

        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            role_check: RoleCheck::default(),
        })
    }

    /// Reads both PEM files and delegates to [`TokenService::new`].
    pub fn from_pem_files(
        public_path: impl AsRef<Path>,
        private_path: impl AsRef<Path>,
    ) -> Result<Self, AuthError> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|e| {
                AuthError::Configuration(format!("cannot read key file {}: {e}", path.display()))
            })
        };
        let public_pem = read(public_path.as_ref())?;
        let private_pem = read(private_path.as_ref())?;
        Self::new(&public_pem, &private_pem)
    }

    pub fn with_role_check(mut self, role_check: RoleCheck) -> Self {
        self.role_check = role_check;
        self
    }

    pub fn role_check(&self) -> RoleCheck {
        self.role_check
    }

    /// Signs a token for `subject_id` valid from now for 50 minutes.
    pub fn issue(&self, subject_id: i64, role: Role) -> Result<String, AuthError> {
        self.issue_at(subject_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject_id: i64,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims::new(subject_id, role, issued_at);
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key).map_err(AuthError::Signing)
    }

    /// Validates signature, issuer and expiry, then applies the role check.
    /// Claims are only returned when every check passes.
    pub fn verify(&self, token: &str, required: Role) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if !self.role_check.permits(claims.role, required) {
            debug!(sub = %claims.sub, role = %claims.role, %required, "Role check failed");
            return Err(AuthError::Forbidden {
                role: claims.role,
                required,
            });
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &ALGORITHM)
            .field("issuer", &ISSUER)
            .field("role_check", &self.role_check)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_issue_then_verify_round_trip() {
        let service = token_service();
        for (id, role) in [(1, Role::Admin), (42, Role::Applicant), (i64::MAX, Role::Admin)] {
            let token = service.issue(id, role).unwrap();
            let claims = service.verify(&token, role).unwrap();
            assert_eq!(claims.sub, id.to_string());
            assert_eq!(claims.role, role);
            assert_eq!(claims.iss, ISSUER);
        }
    }

    #[test]
    fn test_applicant_token_scenario() {
        let service = token_service();
        let token = service.issue(42, Role::Applicant).unwrap();

        let claims = service.verify(&token, Role::Applicant).unwrap();
        assert_eq!(claims.sub, "42");

        let err = service.verify(&token, Role::Admin).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Forbidden {
                role: Role::Applicant,
                required: Role::Admin
            }
        ));
        assert_eq!(err.to_string(), "not authorized to perform this action");
    }

    #[test]
    fn test_admin_token_under_each_role_check() {
        let exact = token_service();
        let token = exact.issue(9, Role::Admin).unwrap();
        assert!(matches!(
            exact.verify(&token, Role::Applicant),
            Err(AuthError::Forbidden { .. })
        ));

        let legacy = token_service().with_role_check(RoleCheck::ApplicantOnly);
        let claims = legacy.verify(&token, Role::Applicant).unwrap();
        assert_eq!(claims.role, Role::Admin);

        // Applicant tokens are still compared in compatibility mode.
        let applicant = legacy.issue(10, Role::Applicant).unwrap();
        assert!(matches!(
            legacy.verify(&applicant, Role::Admin),
            Err(AuthError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_mismatched_public_key_is_invalid() {
        let signer = token_service();
        let verifier = TokenService::new(OTHER_PUBLIC_PEM, PRIVATE_PEM).unwrap();
        let token = signer.issue(5, Role::Applicant).unwrap();
        assert!(matches!(
            verifier.verify(&token, Role::Applicant),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_token_signed_by_other_key_is_invalid() {
        let forger = TokenService::new(OTHER_PUBLIC_PEM, OTHER_PRIVATE_PEM).unwrap();
        let token = forger.issue(5, Role::Admin).unwrap();
        assert!(matches!(
            token_service().verify(&token, Role::Admin),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let service = token_service();
        let issued = Utc::now() - Duration::minutes(51);
        let token = service.issue_at(5, Role::Applicant, issued).unwrap();
        assert!(matches!(
            service.verify(&token, Role::Applicant),
            Err(AuthError::InvalidToken(_))
        ));

        let fresh = service
            .issue_at(5, Role::Applicant, Utc::now() - Duration::minutes(49))
            .unwrap();
        assert!(service.verify(&fresh, Role::Applicant).is_ok());
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let service = token_service();
        for token in ["", "abc", "invalid.token.here"] {
            assert!(matches!(
                service.verify(token, Role::Admin),
                Err(AuthError::InvalidToken(_))
            ));
        }
    }

    #[test]
    fn test_unknown_role_claim_fails_closed() {
        let key = EncodingKey::from_rsa_pem(PRIVATE_PEM).unwrap();
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(ALGORITHM),
            &json!({ "iss": ISSUER, "sub": "1", "iat": now, "exp": now + 600, "roles": "recruiter" }),
            &key,
        )
        .unwrap();
        assert!(matches!(
            token_service().verify(&token, Role::Applicant),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_foreign_issuer_is_invalid() {
        let key = EncodingKey::from_rsa_pem(PRIVATE_PEM).unwrap();
        let mut claims = Claims::new(1, Role::Admin, Utc::now());
        claims.iss = "someone else".to_string();
        let token = encode(&Header::new(ALGORITHM), &claims, &key).unwrap();
        assert!(matches!(
            token_service().verify(&token, Role::Admin),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_missing_keys_are_configuration_errors() {
        assert!(matches!(
            TokenService::new(PUBLIC_PEM, b""),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            TokenService::new(b"", PRIVATE_PEM),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            TokenService::new(b"not a key", PRIVATE_PEM),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_pem_files_reports_missing_file() {
        let err = TokenService::from_pem_files("/nonexistent/pub.pem", "/nonexistent/priv.pem")
            .unwrap_err();
        assert!(matches!(err, AuthError::Configuration(ref msg) if msg.contains("pub.pem")));
    }

    #[test]
    fn test_role_check_parsing() {
        assert_eq!("exact".parse::<RoleCheck>().unwrap(), RoleCheck::Exact);
        assert_eq!(
            "Applicant_Only".parse::<RoleCheck>().unwrap(),
            RoleCheck::ApplicantOnly
        );
        assert!("lenient".parse::<RoleCheck>().is_err());
    }
}
