//! Authentication Module
//!
//! This module provides authentication for the Agora API:
//! - Password hashing and verification for register/login (salted SHA-256)
//! - JWT token issuance and validation (Authorization: Bearer header)
//!
//! Vote casting and all other mutations require an authenticated actor;
//! ranked listings are anonymous. The actor is carried as an explicit
//! [`AuthContext`] value through handlers — never ambient state.

use crate::error::{ApiError, ApiResult};
use agora_core::{UserId, UserRole};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

// ============================================================================
// CLOCK ABSTRACTION (FOR DETERMINISTIC TESTS)
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// Token expiry is validated against this clock instead of letting
/// `jsonwebtoken` read system time, which keeps tests fully deterministic.
pub trait JwtClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// Type-safe JWT secret that prevents accidental logging.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret with validation.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> ApiResult<Self> {
        if secret.is_empty() {
            return Err(ApiError::internal_error("JWT secret must not be empty"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Get the length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    /// Check if the secret is empty without exposing it.
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Check if the secret is the insecure default.
    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

fn build_jwt_secret(secret: String) -> JwtSecret {
    JwtSecret::new(secret).unwrap_or_else(|_| {
        tracing::warn!("Empty JWT secret provided, falling back to insecure default");
        JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.into()))
    })
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// JWT token expiration in seconds (default: 24 hours)
    pub jwt_expiration_secs: i64,

    /// JWT clock skew tolerance in seconds (default: 60)
    pub jwt_clock_skew_secs: i64,

    /// Clock for JWT time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        let secret_str = std::env::var("AGORA_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 86400, // 24 hours
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `AGORA_JWT_SECRET`: JWT signing secret
    /// - `AGORA_JWT_EXPIRATION_SECS`: JWT token expiration (default: 86400)
    /// - `AGORA_JWT_CLOCK_SKEW_SECS`: JWT clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(expiration) = std::env::var("AGORA_JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.jwt_expiration_secs = expiration;
        }

        if let Some(skew) = std::env::var("AGORA_JWT_CLOCK_SKEW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.jwt_clock_skew_secs = skew;
        }

        if config.jwt_secret.is_insecure_default() {
            tracing::warn!(
                "AGORA_JWT_SECRET is not set; using the insecure default. \
                 Do not run production with this secret."
            );
        }

        config
    }
}

// ============================================================================
// CLAIMS & CONTEXT
// ============================================================================

/// JWT claims carried by Agora access tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: UserId,
    /// Username at token issuance
    pub username: String,
    /// Role at token issuance
    pub role: UserRole,
    /// Issued-at, epoch seconds
    pub iat: i64,
    /// Expiration, epoch seconds
    pub exp: i64,
}

/// The authenticated actor, injected into request extensions by the auth
/// middleware and passed explicitly into every operation that needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub username: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

// ============================================================================
// TOKEN ISSUANCE & VALIDATION
// ============================================================================

/// Issue a JWT access token for the given user.
pub fn generate_jwt_token(
    config: &AuthConfig,
    user_id: UserId,
    username: &str,
    role: UserRole,
) -> ApiResult<String> {
    let now = config.clock.now_epoch_secs();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        iat: now,
        exp: now + config.jwt_expiration_secs,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    encode(&Header::new(config.jwt_algorithm), &claims, &key)
        .map_err(|e| ApiError::internal_error(format!("Failed to sign token: {}", e)))
}

/// Validate a JWT access token and return the authenticated actor.
///
/// Signature verification is delegated to `jsonwebtoken`; time validation
/// is done against the injected clock so tests are deterministic.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<AuthContext> {
    let key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false;
    validation.set_required_spec_claims::<&str>(&[]);

    let data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| ApiError::invalid_token(format!("Token validation failed: {}", e)))?;

    let now = config.clock.now_epoch_secs();
    let skew = config.jwt_clock_skew_secs;

    if data.claims.exp + skew < now {
        return Err(ApiError::token_expired());
    }
    if data.claims.iat - skew > now {
        return Err(ApiError::invalid_token("Token issued in the future"));
    }

    Ok(AuthContext::from(data.claims))
}

/// Extract the bearer token from an Authorization header value.
pub fn extract_bearer_token(header_value: &str) -> ApiResult<&str> {
    header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::invalid_token("Authorization header must use Bearer scheme"))
}

// ============================================================================
// PASSWORD HASHING
// ============================================================================

/// Hash a password with a random 16-byte salt. Stored form is
/// `salt_hex$digest_hex` where digest = SHA-256(salt || password).
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    let digest = salted_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };

    let actual = salted_digest(&salt, password);
    // Fixed-length digests; compare without short-circuiting on length.
    if actual.len() != expected.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in actual.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::new_entity_id;

    /// 2024-01-01 00:00:00 UTC
    const T0: i64 = 1704067200;

    fn test_config(clock_at: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("test-secret".to_string()).unwrap(),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(FixedClock(clock_at)),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let config = test_config(T0);
        let user_id = new_entity_id();

        let token = generate_jwt_token(&config, user_id, "alice", UserRole::User).unwrap();
        let ctx = validate_jwt_token(&config, &token).unwrap();

        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.role, UserRole::User);
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issue_config = test_config(T0);
        let token =
            generate_jwt_token(&issue_config, new_entity_id(), "alice", UserRole::User).unwrap();

        // Validate two hours later: past the 1 hour expiry plus skew.
        let late_config = test_config(T0 + 7200);
        let err = validate_jwt_token(&late_config, &token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TokenExpired);
    }

    #[test]
    fn test_token_within_skew_accepted() {
        let issue_config = test_config(T0);
        let token =
            generate_jwt_token(&issue_config, new_entity_id(), "alice", UserRole::User).unwrap();

        // 30 seconds past expiry is inside the 60 second skew.
        let config = test_config(T0 + 3630);
        assert!(validate_jwt_token(&config, &token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config(T0);
        let token = generate_jwt_token(&config, new_entity_id(), "alice", UserRole::User).unwrap();

        let mut other = test_config(T0);
        other.jwt_secret = JwtSecret::new("other-secret".to_string()).unwrap();
        assert!(validate_jwt_token(&other, &token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc").unwrap(), "abc");
        assert!(extract_bearer_token("Basic abc").is_err());
    }

    #[test]
    fn test_admin_claims_round_trip() {
        let config = test_config(T0);
        let token = generate_jwt_token(&config, new_entity_id(), "root", UserRole::Admin).unwrap();
        let ctx = validate_jwt_token(&config, &token).unwrap();
        assert!(ctx.is_admin());
    }

    #[test]
    fn test_password_round_trip() {
        let stored = hash_password("hunter2!");
        assert!(verify_password("hunter2!", &stored));
        assert!(!verify_password("hunter3!", &stored));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let a = hash_password("same-password");
        let b = hash_password("same-password");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn test_verify_rejects_malformed_stored_hash() {
        assert!(!verify_password("anything", "not-a-hash"));
        assert!(!verify_password("anything", "zz$zz"));
    }
}
