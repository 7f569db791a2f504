//! TTL intake from HTTP cache headers
//!
//! The fetch layer hands origin responses to the storage adapters as bytes
//! plus two optional lifetimes. This module derives those lifetimes from a
//! `Cache-Control` header value: `s-maxage` feeds the shared lifetime,
//! `max-age` the origin lifetime. An explicit override (e.g. a proxy-supplied
//! TTL header) seeds the shared lifetime directly. No header and no override
//! means "do not cache", expressed as an origin lifetime of zero rather than
//! left unset.

use regex::Regex;

/// Cache lifetimes derived for a single response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TtlDirectives {
    /// Origin (private cache) lifetime in seconds
    pub max_age: Option<u64>,
    /// Shared (CDN) lifetime in seconds; dominates `max_age` when set
    pub max_age_shared: Option<u64>,
}

impl TtlDirectives {
    /// Directives with explicit lifetimes
    #[must_use]
    pub fn new(max_age: Option<u64>, max_age_shared: Option<u64>) -> Self {
        Self {
            max_age,
            max_age_shared,
        }
    }

    /// Derive lifetimes from a `Cache-Control` header value and an optional
    /// shared-lifetime override.
    #[must_use]
    pub fn from_cache_control(cache_control: Option<&str>, shared_override: Option<u64>) -> Self {
        let mut ttl = Self {
            max_age: None,
            max_age_shared: shared_override,
        };
        let Some(value) = cache_control else {
            ttl.max_age = Some(0);
            return ttl;
        };

        if let Some(seconds) = directive_seconds(value, r"s-maxage\s*=\s*(\d+)") {
            ttl.max_age_shared = Some(seconds);
        }
        if let Some(seconds) = directive_seconds(value, r"max-age\s*=\s*(\d+)") {
            ttl.max_age = Some(seconds);
        }
        if ttl.max_age.is_none() && ttl.max_age_shared.is_none() {
            ttl.max_age = Some(0);
        }
        ttl
    }

    /// Whether the effective lifetime is zero, i.e. the response must not be
    /// cached at all. Adapters skip the write entirely in that case.
    #[must_use]
    pub fn is_no_store(&self) -> bool {
        match self.max_age_shared {
            Some(shared) => shared == 0,
            None => self.max_age == Some(0),
        }
    }
}

fn directive_seconds(value: &str, pattern: &str) -> Option<u64> {
    let re = Regex::new(pattern).ok()?;
    re.captures(value)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_directives() {
        let ttl = TtlDirectives::from_cache_control(Some("public, max-age=60, s-maxage=300"), None);
        assert_eq!(ttl.max_age, Some(60));
        assert_eq!(ttl.max_age_shared, Some(300));
        assert!(!ttl.is_no_store());
    }

    #[test]
    fn test_whitespace_around_equals() {
        let ttl = TtlDirectives::from_cache_control(Some("s-maxage = 120"), None);
        assert_eq!(ttl.max_age_shared, Some(120));
        assert_eq!(ttl.max_age, None);
    }

    #[test]
    fn test_missing_header_means_no_store() {
        let ttl = TtlDirectives::from_cache_control(None, None);
        assert_eq!(ttl.max_age, Some(0));
        assert!(ttl.is_no_store());
    }

    #[test]
    fn test_header_without_lifetimes_means_no_store() {
        let ttl = TtlDirectives::from_cache_control(Some("no-transform"), None);
        assert_eq!(ttl.max_age, Some(0));
        assert!(ttl.is_no_store());
    }

    #[test]
    fn test_override_seeds_shared_lifetime() {
        let ttl = TtlDirectives::from_cache_control(Some("no-transform"), Some(900));
        assert_eq!(ttl.max_age_shared, Some(900));
        assert_eq!(ttl.max_age, None);
        assert!(!ttl.is_no_store());

        // A header s-maxage wins over the override
        let ttl = TtlDirectives::from_cache_control(Some("s-maxage=10"), Some(900));
        assert_eq!(ttl.max_age_shared, Some(10));
    }

    #[test]
    fn test_missing_header_with_override_still_caches() {
        let ttl = TtlDirectives::from_cache_control(None, Some(600));
        assert_eq!(ttl.max_age, Some(0));
        assert_eq!(ttl.max_age_shared, Some(600));
        // Shared lifetime dominates, so this is not a no-store
        assert!(!ttl.is_no_store());
    }

    #[test]
    fn test_no_store_rules() {
        assert!(TtlDirectives::new(Some(0), None).is_no_store());
        assert!(TtlDirectives::new(Some(600), Some(0)).is_no_store());
        assert!(!TtlDirectives::new(Some(0), Some(600)).is_no_store());
        assert!(!TtlDirectives::new(None, None).is_no_store());
    }
}
