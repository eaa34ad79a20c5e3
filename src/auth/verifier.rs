//! Request authentication guard
//!
//! Runs in front of every protected handler: pulls the bearer token out of
//! the Authorization header, decodes it, and hands the claims to the
//! handler for the duration of that one request. All failures surface as
//! 401 with a reason that distinguishes expiry from invalidity.

use hyper::header::AUTHORIZATION;
use hyper::HeaderMap;

use crate::auth::jwt::{extract_bearer, Claims, JwtCodec, TokenError};
use crate::types::ApiError;

/// Authenticate a request from its headers
///
/// On success the returned claims are guaranteed to carry a subject. A
/// token that decodes cleanly but has no subject is rejected here, not in
/// the codec: signature and expiry checks passed, yet the token names no
/// identity to act as.
pub fn authenticate(headers: &HeaderMap, codec: &JwtCodec) -> Result<Claims, ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = extract_bearer(header)
        .ok_or_else(|| ApiError::Unauthenticated("No token provided".to_string()))?;

    let claims = codec.decode(token).map_err(|e| match e {
        TokenError::Expired => ApiError::Unauthenticated("Token expired".to_string()),
        TokenError::InvalidSignature | TokenError::Malformed => {
            ApiError::Unauthenticated("Invalid token".to_string())
        }
    })?;

    match claims.sub.as_deref() {
        Some(sub) if !sub.is_empty() => Ok(claims),
        _ => Err(ApiError::Unauthenticated("Invalid token".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenInput;
    use chrono::{Duration, Utc};
    use hyper::header::HeaderValue;

    fn codec() -> JwtCodec {
        JwtCodec::new("test-secret")
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    fn issue(codec: &JwtCodec) -> String {
        codec
            .issue(
                TokenInput {
                    subject: "user-1".to_string(),
                    email: "a@x.com".to_string(),
                    role: "developer".to_string(),
                },
                Some(Duration::minutes(30)),
            )
            .unwrap()
    }

    #[test]
    fn test_valid_token_yields_claims() {
        let codec = codec();
        let token = issue(&codec);
        let claims = authenticate(&headers_with(&token), &codec).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert_eq!(claims.email, "a@x.com");
    }

    #[test]
    fn test_missing_header_rejected() {
        let err = authenticate(&HeaderMap::new(), &codec()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(ref r) if r == "No token provided"));
    }

    #[test]
    fn test_expired_token_distinguished() {
        let codec = codec();
        let token = codec
            .issue(
                TokenInput {
                    subject: "user-1".to_string(),
                    email: "a@x.com".to_string(),
                    role: "developer".to_string(),
                },
                Some(Duration::minutes(-5)),
            )
            .unwrap();

        let err = authenticate(&headers_with(&token), &codec).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(ref r) if r == "Token expired"));
    }

    #[test]
    fn test_garbage_token_rejected_as_invalid() {
        let err = authenticate(&headers_with("garbage"), &codec()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(ref r) if r == "Invalid token"));
    }

    #[test]
    fn test_well_formed_token_without_subject_rejected() {
        // Signature and expiry pass, but no identity is named
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let claims = Claims {
            sub: None,
            email: "a@x.com".to_string(),
            role: "developer".to_string(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp() as u64,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = authenticate(&headers_with(&token), &codec()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(ref r) if r == "Invalid token"));
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        let err = authenticate(&headers, &codec()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(ref r) if r == "No token provided"));
    }
}
