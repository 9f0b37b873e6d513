//! # Path Rewrite Codec
//!
//! Site identity and personalization variants are smuggled through a single
//! URL path as reserved segments (`_site_<name>`, `_variantId_<id>`)
//! inserted immediately after the leading slash. The codec is reversible
//! and the two markers compose in either order; decoding an
//! already-normalized path is a no-op.
//!
//! Identifiers are not escaped and must not contain `/`; that is a caller
//! contract, not something the codec validates.

/// Reserved path segment prefix carrying the site name
pub const SITE_PREFIX: &str = "_site_";

/// Reserved path segment prefix carrying the personalization variant
pub const VARIANT_PREFIX: &str = "_variantId_";

/// Site identity extracted from a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRewrite {
    pub site_name: String,
    pub normalized_path: String,
}

/// Personalization variant extracted from a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRewrite {
    pub variant_id: Option<String>,
    pub normalized_path: String,
}

/// Normalize a raw path to an absolute form
pub fn parse_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Prefix a path with the site marker segment
pub fn encode_site(path: &str, site_name: &str) -> String {
    format!("/{}{}{}", SITE_PREFIX, site_name, parse_path(path))
}

/// Extract the site marker from a path
///
/// Returns the embedded site name and the path with the marker segment
/// removed, or `default_site` and the path unchanged when no marker is
/// present.
pub fn decode_site(path: &str, default_site: &str) -> SiteRewrite {
    let path = parse_path(path);
    match extract_marker(&path, SITE_PREFIX) {
        Some((site_name, normalized_path)) => SiteRewrite {
            site_name,
            normalized_path,
        },
        None => SiteRewrite {
            site_name: default_site.to_string(),
            normalized_path: path,
        },
    }
}

/// Remove any site marker segments from a path; no-op when none exist
pub fn strip_site(path: &str) -> String {
    strip_marker(path, SITE_PREFIX)
}

/// Prefix a path with the personalization variant marker segment
pub fn encode_variant(path: &str, variant_id: &str) -> String {
    format!("/{}{}{}", VARIANT_PREFIX, variant_id, parse_path(path))
}

/// Extract the personalization variant marker from a path
pub fn decode_variant(path: &str) -> VariantRewrite {
    let path = parse_path(path);
    match extract_marker(&path, VARIANT_PREFIX) {
        Some((variant_id, normalized_path)) => VariantRewrite {
            variant_id: Some(variant_id),
            normalized_path,
        },
        None => VariantRewrite {
            variant_id: None,
            normalized_path: path,
        },
    }
}

/// Remove any variant marker segments from a path; no-op when none exist
pub fn strip_variant(path: &str) -> String {
    strip_marker(path, VARIANT_PREFIX)
}

/// Find the first segment carrying `prefix`, returning the embedded
/// identifier and the path with that segment removed
fn extract_marker(path: &str, prefix: &str) -> Option<(String, String)> {
    if !path.contains(prefix) {
        return None;
    }

    let segments: Vec<&str> = path.split('/').collect();
    let position = segments
        .iter()
        .position(|segment| segment.starts_with(prefix))?;

    let identifier = segments[position][prefix.len()..].to_string();
    let remaining: Vec<&str> = segments
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != position)
        .map(|(_, s)| *s)
        .collect();

    Some((identifier, rejoin(&remaining)))
}

fn strip_marker(path: &str, prefix: &str) -> String {
    if !path.contains(prefix) {
        return path.to_string();
    }

    let remaining: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.starts_with(prefix))
        .collect();
    rejoin(&remaining)
}

fn rejoin(segments: &[&str]) -> String {
    let joined = format!("/{}", segments.join("/"));
    let collapsed = joined.replace("//", "/");
    if collapsed.is_empty() {
        "/".to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_normalizes() {
        assert_eq!(parse_path(""), "/");
        assert_eq!(parse_path("/"), "/");
        assert_eq!(parse_path("products"), "/products");
        assert_eq!(parse_path("/products"), "/products");
    }

    #[test]
    fn test_site_round_trip() {
        let encoded = encode_site("/products/shoes", "acme");
        assert_eq!(encoded, "/_site_acme/products/shoes");

        let decoded = decode_site(&encoded, "default");
        assert_eq!(decoded.site_name, "acme");
        assert_eq!(decoded.normalized_path, "/products/shoes");
    }

    #[test]
    fn test_variant_round_trip() {
        let encoded = encode_variant("/products", "variant-7");
        assert_eq!(encoded, "/_variantId_variant-7/products");

        let decoded = decode_variant(&encoded);
        assert_eq!(decoded.variant_id.as_deref(), Some("variant-7"));
        assert_eq!(decoded.normalized_path, "/products");
    }

    #[test]
    fn test_decode_without_marker_returns_default() {
        let decoded = decode_site("/products", "default");
        assert_eq!(decoded.site_name, "default");
        assert_eq!(decoded.normalized_path, "/products");

        let decoded = decode_variant("/products");
        assert_eq!(decoded.variant_id, None);
        assert_eq!(decoded.normalized_path, "/products");
    }

    #[test]
    fn test_marker_only_path_decodes_to_root() {
        let decoded = decode_site("/_site_acme/", "default");
        assert_eq!(decoded.site_name, "acme");
        assert_eq!(decoded.normalized_path, "/");

        let decoded = decode_site("/_site_acme", "default");
        assert_eq!(decoded.site_name, "acme");
        assert_eq!(decoded.normalized_path, "/");
    }

    #[test]
    fn test_markers_compose_in_either_order() {
        let both = encode_variant(&encode_site("/page", "acme"), "v1");
        assert_eq!(both, "/_variantId_v1/_site_acme/page");

        let site = decode_site(&both, "default");
        assert_eq!(site.site_name, "acme");
        assert_eq!(site.normalized_path, "/_variantId_v1/page");

        let variant = decode_variant(&both);
        assert_eq!(variant.variant_id.as_deref(), Some("v1"));
        assert_eq!(variant.normalized_path, "/_site_acme/page");

        let other_order = encode_site(&encode_variant("/page", "v1"), "acme");
        let site = decode_site(&other_order, "default");
        assert_eq!(site.site_name, "acme");
        let variant = decode_variant(&site.normalized_path);
        assert_eq!(variant.variant_id.as_deref(), Some("v1"));
        assert_eq!(variant.normalized_path, "/page");
    }

    #[test]
    fn test_decode_is_idempotent() {
        let decoded = decode_site("/_site_acme/page", "default");
        let again = decode_site(&decoded.normalized_path, "default");
        assert_eq!(again.site_name, "default");
        assert_eq!(again.normalized_path, "/page");
    }

    #[test]
    fn test_strip_functions() {
        assert_eq!(strip_site("/_site_acme/page"), "/page");
        assert_eq!(strip_site("/page"), "/page");
        assert_eq!(strip_variant("/_variantId_v1/page"), "/page");
        assert_eq!(strip_variant(&strip_variant("/_variantId_v1/page")), "/page");
        assert_eq!(
            strip_variant(&strip_site("/_site_acme/_variantId_v1/page")),
            "/page"
        );
    }
}
