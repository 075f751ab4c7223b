//! Glob key matching with `*` as the only wildcard.
//!
//! Used for L1 pattern invalidation, the in-memory store's `KEYS`, and
//! invalidation-rule matching. Semantics follow the remote store's
//! server-side key listing: `*` matches any run of characters, everything
//! else is literal.

use regex::Regex;
use tradecache_core::Result;

/// Compile a `*`-wildcard glob into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut escaped = String::with_capacity(pattern.len() + 8);
    escaped.push('^');
    for (i, part) in pattern.split('*').enumerate() {
        if i > 0 {
            escaped.push_str(".*");
        }
        escaped.push_str(&regex::escape(part));
    }
    escaped.push('$');
    Ok(Regex::new(&escaped)?)
}

/// Whether `key` matches the glob `pattern`.
///
/// Falls back to exact comparison if the pattern fails to compile, so a
/// malformed pattern never matches more than itself.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == key;
    }
    match glob_to_regex(pattern) {
        Ok(re) => re.is_match(key),
        Err(_) => pattern == key,
    }
}

/// Whether two glob patterns are related, for rule-family matching.
///
/// Patterns are related when they are equal, or when either one matches the
/// other taken as a literal key. `invalidate("session:*")` therefore fires
/// rules registered for `session:*` as well as rules pinned to
/// `session:abc`.
pub fn globs_overlap(a: &str, b: &str) -> bool {
    a == b || glob_match(a, b) || glob_match(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        assert!(glob_match("session:abc", "session:abc"));
        assert!(!glob_match("session:abc", "session:def"));
    }

    #[test]
    fn test_wildcard_match() {
        assert!(glob_match("session:*", "session:abc"));
        assert!(glob_match("user:*:positions", "user:42:positions"));
        assert!(!glob_match("session:*", "trading:session:abc"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(glob_match("price.BTC-USD", "price.BTC-USD"));
        assert!(!glob_match("price.BTC-USD", "priceXBTC-USD"));
        assert!(glob_match("book:[spot]:*", "book:[spot]:ETH"));
    }

    #[test]
    fn test_globs_overlap() {
        assert!(globs_overlap("session:*", "session:*"));
        assert!(globs_overlap("session:*", "session:abc"));
        assert!(globs_overlap("session:abc", "session:*"));
        assert!(!globs_overlap("session:*", "portfolio:*"));
    }
}
