/// Shared JWT codec for the storefront services
///
/// Tokens are HS256-signed with a secret distributed out-of-band to every
/// service. The issuing service mints tokens; every service (issuing or
/// verifying-only) parses them with the same codec.
///
/// ## Wire format
///
/// `header.claims.signature`, each segment base64url without padding.
/// Claims are exactly `{"sub", "roles", "iat", "exp"}` with timestamps in
/// Unix seconds.
///
/// ## Parse order
///
/// 1. Structure: three non-empty segments and a header naming HS256
/// 2. Signature: constant-time HMAC comparison over `header.claims`
/// 3. Claims: JSON decoding of the payload
/// 4. Expiry: rejected once `now >= exp`, no leeway
///
/// No claim is looked at before step 2 succeeds.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::TokenCodec;
/// use std::time::Duration;
///
/// let codec = TokenCodec::new(b"k3Jp9QzX7vR2mW8tL5yN4bH6cF1dG0sA").unwrap();
/// let token = codec
///     .mint("a@x.com", &["ROLE_USER".to_string()], Duration::from_secs(3600))
///     .unwrap();
/// let claims = codec.parse(&token).unwrap();
/// assert_eq!(claims.sub, "a@x.com");
/// ```
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Minimum secret length accepted for HS256 (256 bits)
pub const MIN_SECRET_BYTES: usize = 32;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// Signed payload carried inside a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// Role names in the order they were granted
    pub roles: Vec<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Whether the token is still usable at `now` (Unix seconds)
    pub fn is_live_at(&self, now: i64) -> bool {
        now < self.exp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    MalformedToken,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("signing secret must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,
    #[error("token lifetime must be at least one second")]
    InvalidTtl,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Short machine-readable label, safe to log
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::MalformedToken => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired => "expired",
            TokenError::WeakSecret => "weak_secret",
            TokenError::InvalidTtl => "invalid_ttl",
            TokenError::Encoding(_) => "encoding",
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Mints and parses HS256 tokens with one shared secret
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &JWT_ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from the raw shared secret
    ///
    /// Secrets shorter than [`MIN_SECRET_BYTES`] are rejected.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(TokenError::WeakSecret);
        }

        let mut validation = Validation::new(JWT_ALGORITHM);
        // Expiry is checked by hand so that `now == exp` is already expired
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Mint a token for `subject` valid for `ttl` from now
    pub fn mint(&self, subject: &str, roles: &[String], ttl: Duration) -> Result<String, TokenError> {
        self.mint_at(subject, roles, Utc::now(), ttl)
    }

    /// Mint a token with an explicit issue time
    pub fn mint_at(
        &self,
        subject: &str,
        roles: &[String],
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::InvalidTtl)?;
        if ttl_secs < 1 {
            return Err(TokenError::InvalidTtl);
        }

        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.to_vec(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify and decode a token against the current time
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        self.parse_at(token, Utc::now().timestamp())
    }

    /// Verify and decode a token as of `now` (Unix seconds)
    pub fn parse_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(TokenError::MalformedToken);
        }

        let header = decode_header(token).map_err(|_| TokenError::MalformedToken)?;
        if header.alg != JWT_ALGORITHM {
            return Err(TokenError::MalformedToken);
        }

        // A signature segment that is not even base64 cannot match
        if URL_SAFE_NO_PAD.decode(segments[2]).is_err() {
            return Err(TokenError::BadSignature);
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::MalformedToken,
            }
        })?;

        if !data.claims.is_live_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Request-path token check
///
/// Performs no I/O and holds no mutable state; every failure collapses to
/// "invalid" after the classification is logged.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    codec: Arc<TokenCodec>,
}

impl TokenValidator {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Whether the token verifies and is not expired
    pub fn validate(&self, token: &str) -> bool {
        self.claims(token).is_some()
    }

    /// Verified claims, or `None` for any invalid token
    pub fn claims(&self, token: &str) -> Option<Claims> {
        match self.codec.parse(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!(reason = e.reason(), "Rejected bearer token");
                None
            }
        }
    }

    /// Subject of a valid token
    pub fn subject(&self, token: &str) -> Option<String> {
        self.claims(token).map(|c| c.sub)
    }

    /// Roles of a valid token
    pub fn roles(&self, token: &str) -> Option<Vec<String>> {
        self.claims(token).map(|c| c.roles)
    }
}

// ============================================================================
// Tests
// ============================================================================
