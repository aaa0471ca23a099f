//! Cache keys and local filenames for remote assets.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Hosts that serve short-lived signed URLs. Their query string changes on
/// every fetch, so it is not part of the cache key.
pub const SIGNED_HOSTS: &[&str] = &[
    "prod-files-secure.s3.us-west-2.amazonaws.com",
    "s3.us-west-2.amazonaws.com",
];

/// URL prefix under which cached assets are served.
pub const PUBLIC_PREFIX: &str = "/images/notion/";

/// Directory under the public root that holds cached assets.
pub const ASSET_SUBDIR: &str = "images/notion";

pub const DEFAULT_EXTENSION: &str = "png";

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([a-zA-Z0-9]+)$").unwrap());

/// Extension before a query or the end, for keys that aren't URLs.
static RAW_EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([a-zA-Z0-9]+)(?:\?|$)").unwrap());

/// Normalized cache key for an asset URL.
///
/// Signed hosts keep origin and path only. Every other host keeps the query
/// too. Input that doesn't parse as a URL is its own key.
pub fn cache_key(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };

    let mut key = format!("{}{}", url.origin().ascii_serialization(), url.path());
    let signed = url
        .host_str()
        .is_some_and(|host| SIGNED_HOSTS.contains(&host));
    if !signed {
        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            key.push('?');
            key.push_str(query);
        }
    }
    key
}

/// Lowercased extension of the key's URL path, or `png`.
///
/// Keys that don't parse as URLs are matched as raw strings.
pub fn extension(key: &str) -> String {
    let found = match Url::parse(key) {
        Ok(url) => capture_extension(&EXTENSION_RE, url.path()),
        Err(_) => capture_extension(&RAW_EXTENSION_RE, key),
    };
    found.unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn capture_extension(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Content-addressed filename for a cache key: 16 hex chars of its hash plus
/// the extension.
pub fn local_filename(key: &str) -> String {
    let hash = blake3::hash(key.as_bytes()).to_hex();
    format!("{}.{}", &hash.as_str()[..16], extension(key))
}

/// Public path a cache key is served from.
pub fn public_path(key: &str) -> String {
    format!("{PUBLIC_PREFIX}{}", local_filename(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_hosts_drop_query() {
        let a = "https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/abc/img.PNG?X-Amz-Signature=1&X-Amz-Date=2";
        let b = "https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/abc/img.PNG?X-Amz-Signature=9";
        assert_eq!(cache_key(a), cache_key(b));
        assert_eq!(
            cache_key(a),
            "https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/abc/img.PNG"
        );
    }

    #[test]
    fn test_other_hosts_keep_query() {
        let a = "https://images.unsplash.com/photo-1?w=1400&q=80";
        let b = "https://images.unsplash.com/photo-1?w=800&q=80";
        assert_eq!(cache_key(a), a);
        assert_ne!(cache_key(a), cache_key(b));
        assert_eq!(cache_key("https://example.com/a.jpg"), "https://example.com/a.jpg");
    }

    #[test]
    fn test_unparseable_is_own_key() {
        assert_eq!(cache_key("not a url"), "not a url");
        assert_eq!(extension("not a url"), "png");
    }

    #[test]
    fn test_extension_of_raw_key() {
        assert_eq!(extension("images/Photo.JPG?v=1"), "jpg");
        assert_eq!(extension("/uploads/clip.webp"), "webp");
        assert_eq!(extension("no-extension?x=1"), "png");
    }

    #[test]
    fn test_filename_shape() {
        let key = cache_key("https://prod-files-secure.s3.us-west-2.amazonaws.com/x/Photo.JPEG?sig=1");
        let name = local_filename(&key);
        let (stem, ext) = name.split_once('.').unwrap();
        assert_eq!(stem.len(), 16);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "jpeg");
        assert!(public_path(&key).starts_with(PUBLIC_PREFIX));
    }

    #[test]
    fn test_extension_defaults() {
        assert_eq!(extension("https://example.com/image"), "png");
        assert_eq!(extension("https://example.com/a.b/image"), "png");
        assert_eq!(extension("https://example.com/a.webp?x=1.gif"), "webp");
    }

    #[test]
    fn test_filename_is_stable() {
        assert_eq!(
            local_filename("https://example.com/a.png"),
            local_filename("https://example.com/a.png")
        );
        assert_ne!(
            local_filename("https://example.com/a.png"),
            local_filename("https://example.com/b.png")
        );
    }
}
