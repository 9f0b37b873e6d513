//! Site resolution by hostname or explicit name.
//!
//! Hostname matching is case-insensitive and port-agnostic. Lookup order:
//! exact hostname, then `*.domain` wildcard, then the configured default —
//! resolution by hostname never fails. Lookup by name is a direct match
//! against the configured list plus the default site and does not fall
//! through to hostname matching.

use crate::site::Site;

/// Resolves requests to configured site records
#[derive(Debug, Clone)]
pub struct SiteResolver {
    sites: Vec<Site>,
    default_site: Site,
}

impl SiteResolver {
    pub fn new(sites: Vec<Site>, default_site: Site) -> Self {
        Self {
            sites,
            default_site,
        }
    }

    /// The configured default site
    pub fn default_site(&self) -> &Site {
        &self.default_site
    }

    /// Resolve a site by request hostname, falling back to the default
    pub fn get_by_host(&self, hostname: &str) -> &Site {
        let host = normalize_hostname(hostname);

        if let Some(site) = self
            .sites
            .iter()
            .find(|site| site.host_name.to_lowercase() == host)
        {
            return site;
        }

        if let Some(site) = self
            .sites
            .iter()
            .find(|site| matches_wildcard(&site.host_name, &host))
        {
            return site;
        }

        &self.default_site
    }

    /// Resolve a site by name, case-insensitively
    pub fn get_by_name(&self, name: &str) -> Option<&Site> {
        let search = name.to_lowercase();

        if let Some(site) = self
            .sites
            .iter()
            .find(|site| site.name.to_lowercase() == search)
        {
            return Some(site);
        }

        if self.default_site.name.to_lowercase() == search {
            return Some(&self.default_site);
        }

        None
    }
}

/// Strip a trailing `:port` and lower-case the hostname
pub fn normalize_hostname(hostname: &str) -> String {
    let host = match hostname.find(':') {
        Some(idx) if idx > 0 => &hostname[..idx],
        _ => hostname,
    };
    host.to_lowercase()
}

/// Match a `*.domain` pattern: the hostname equals the remainder or is a
/// dotted suffix of it
fn matches_wildcard(pattern: &str, hostname: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let hostname = hostname.to_lowercase();

    match pattern.strip_prefix("*.") {
        Some(suffix) => hostname == suffix || hostname.ends_with(&format!(".{suffix}")),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SiteResolver {
        SiteResolver::new(
            vec![
                Site::new("acme", "acme.example.com"),
                Site::new("tenants", "*.tenants.example.com"),
            ],
            Site::new("default", "localhost"),
        )
    }

    #[test]
    fn test_exact_host_match_is_case_insensitive() {
        let resolver = resolver();
        assert_eq!(resolver.get_by_host("ACME.Example.COM").name, "acme");
        assert_eq!(resolver.get_by_host("acme.example.com:8080").name, "acme");
    }

    #[test]
    fn test_wildcard_host_match() {
        let resolver = resolver();
        assert_eq!(resolver.get_by_host("a.tenants.example.com").name, "tenants");
        assert_eq!(resolver.get_by_host("tenants.example.com").name, "tenants");
        assert_eq!(
            resolver.get_by_host("deep.sub.tenants.example.com").name,
            "tenants"
        );
    }

    #[test]
    fn test_unmatched_host_falls_back_to_default() {
        let resolver = resolver();
        assert_eq!(resolver.get_by_host("unknown.example.org").name, "default");
    }

    #[test]
    fn test_get_by_name() {
        let resolver = resolver();
        assert_eq!(resolver.get_by_name("ACME").unwrap().name, "acme");
        assert_eq!(resolver.get_by_name("default").unwrap().name, "default");
        assert!(resolver.get_by_name("missing").is_none());
    }

    #[test]
    fn test_get_by_name_ignores_hostnames() {
        let resolver = resolver();
        assert!(resolver.get_by_name("acme.example.com").is_none());
    }

    #[test]
    fn test_normalize_hostname() {
        assert_eq!(normalize_hostname("Example.COM:443"), "example.com");
        assert_eq!(normalize_hostname("example.com"), "example.com");
    }
}
