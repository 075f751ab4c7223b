//! Cache key construction.

use sha2::{Digest, Sha256};

/// Raw keys longer than this are replaced by a stable digest to bound the
/// key length on the remote store.
const MAX_RAW_KEY_LEN: usize = 100;

/// Build the full store key: `{prefix}{raw}`, with over-long raw keys
/// replaced by their SHA-256 hex digest.
pub fn build_key(prefix: &str, raw: &str) -> String {
    if raw.len() > MAX_RAW_KEY_LEN {
        let digest = Sha256::digest(raw.as_bytes());
        format!("{prefix}{}", hex::encode(digest))
    } else {
        format!("{prefix}{raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_key_is_prefixed() {
        assert_eq!(build_key("md:", "BTC-USD"), "md:BTC-USD");
    }

    #[test]
    fn test_long_key_is_hashed() {
        let raw = "x".repeat(101);
        let key = build_key("api:", &raw);
        assert!(key.starts_with("api:"));
        // SHA-256 hex digest is 64 chars.
        assert_eq!(key.len(), "api:".len() + 64);
        assert!(!key.contains(&raw));
    }

    #[test]
    fn test_long_key_is_stable() {
        let raw = "y".repeat(200);
        assert_eq!(build_key("api:", &raw), build_key("api:", &raw));
    }

    #[test]
    fn test_boundary_length_not_hashed() {
        let raw = "z".repeat(100);
        assert_eq!(build_key("", &raw), raw);
    }
}
