//! JWT token issuance and validation
//!
//! A thin codec over HS256-signed tokens carrying the authenticated
//! identity. Tokens are stateless: nothing is persisted server-side and
//! there is no revocation, so expiry and signature integrity are the only
//! validity gates.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Signing algorithm is fixed; not a configuration surface.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Fallback token lifetime when the caller does not supply one.
///
/// Distinct from the 30-minute lifetime the login handler passes
/// explicitly. Both values are inherited from the deployments this
/// service replaces and are kept as-is.
const DEFAULT_TTL_MINUTES: i64 = 15;

/// Claims carried by an access token
///
/// `sub` is optional at the codec layer: a correctly signed, unexpired
/// token without a subject still decodes. Rejecting it is the verifier's
/// job, which keeps "cryptographically valid" and "semantically usable"
/// as separate judgements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub email: String,
    pub role: String,
    /// Expiration as Unix seconds
    pub exp: u64,
}

/// Identity data embedded into a newly issued token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub subject: String,
    pub email: String,
    pub role: String,
}

/// Token decode failures
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
}

/// Encodes and decodes signed access tokens with a single shared secret
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // No clock leeway: a token is expired the moment its exp elapses
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a signed token for `input`, expiring after `ttl`
    ///
    /// Falls back to a 15-minute lifetime when `ttl` is `None`.
    pub fn issue(&self, input: TokenInput, ttl: Option<Duration>) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(DEFAULT_TTL_MINUTES));
        let expire = Utc::now() + ttl;

        let claims = Claims {
            sub: Some(input.subject),
            email: input.email,
            role: input.role,
            exp: expire.timestamp().max(0) as u64,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Malformed)
    }

    /// Decode and validate a token string
    ///
    /// Signature and expiry are checked here; subject presence is not.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> JwtCodec {
        JwtCodec::new("test-secret")
    }

    fn input() -> TokenInput {
        TokenInput {
            subject: "64f0c1a2b3d4e5f6a7b8c9d0".to_string(),
            email: "a@x.com".to_string(),
            role: "developer".to_string(),
        }
    }

    #[test]
    fn test_issue_then_decode_round_trip() {
        let codec = codec();
        let token = codec.issue(input(), Some(Duration::minutes(30))).unwrap();

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("64f0c1a2b3d4e5f6a7b8c9d0"));
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, "developer");
        assert!(claims.exp > Utc::now().timestamp() as u64);
    }

    #[test]
    fn test_default_ttl_is_fifteen_minutes() {
        let codec = codec();
        let token = codec.issue(input(), None).unwrap();
        let claims = codec.decode(&token).unwrap();

        let expected = (Utc::now() + Duration::minutes(15)).timestamp() as u64;
        // Allow a couple of seconds between issue and assertion
        assert!(claims.exp.abs_diff(expected) <= 2);
    }

    #[test]
    fn test_past_expiry_fails_expired() {
        let codec = codec();
        let token = codec.issue(input(), Some(Duration::minutes(-5))).unwrap();
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let codec = codec();
        let token = codec.issue(input(), Some(Duration::zero())).unwrap();
        // exp has second resolution; step past the issuance instant
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let codec = codec();
        let token = codec.issue(input(), Some(Duration::minutes(30))).unwrap();

        // Flip one character in the signature segment
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(codec.decode(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_fails_malformed() {
        let codec = codec();
        assert_eq!(codec.decode("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec.decode(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_secret_fails_invalid_signature() {
        let token = codec().issue(input(), Some(Duration::minutes(30))).unwrap();
        let other = JwtCodec::new("different-secret");
        assert_eq!(other.decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_token_without_subject_still_decodes() {
        // The codec accepts a subjectless token; the verifier rejects it
        let codec = codec();
        let claims = Claims {
            sub: None,
            email: "a@x.com".to_string(),
            role: "developer".to_string(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp() as u64,
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let decoded = codec.decode(&token).unwrap();
        assert!(decoded.sub.is_none());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer(Some("bearer abc")), None);
        assert_eq!(extract_bearer(Some("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer(Some("Bearer ")), None);
        assert_eq!(extract_bearer(None), None);
    }
}
