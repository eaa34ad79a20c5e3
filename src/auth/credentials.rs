//! Credential comparison
//!
//! The stored credential is an opaque secret compared verbatim against the
//! submission. Keeping the comparison behind this narrow seam means a
//! salted-hash scheme can replace it without touching the login handler.

/// Compare a submitted password against the stored credential
pub fn verify_password(submitted: &str, stored: &str) -> bool {
    submitted == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(verify_password("pw", "pw"));
    }

    #[test]
    fn test_mismatch() {
        assert!(!verify_password("pw", "other"));
        assert!(!verify_password("pw", "PW"));
        assert!(!verify_password("", "pw"));
    }

    #[test]
    fn test_empty_matches_empty() {
        assert!(verify_password("", ""));
    }
}
