//! Request identity keys.

use sha2::{Digest, Sha256};

/// Compute the store key for a request: method plus absolute URL.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = compute_request_key("GET", "https://example.com/");
        let key2 = compute_request_key("GET", "https://example.com/");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        assert_eq!(
            compute_request_key("get", "https://example.com/"),
            compute_request_key("GET", "https://example.com/")
        );
    }

    #[test]
    fn test_key_different_method() {
        assert_ne!(
            compute_request_key("GET", "https://example.com/"),
            compute_request_key("POST", "https://example.com/")
        );
    }

    #[test]
    fn test_key_different_url() {
        assert_ne!(
            compute_request_key("GET", "https://example.com/a"),
            compute_request_key("GET", "https://example.com/a?x=1")
        );
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
