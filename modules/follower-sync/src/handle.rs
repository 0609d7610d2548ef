//! Derive a canonical Instagram handle from whatever an editor typed into
//! the artist's `instagram_url` field: a full profile URL, a bare handle,
//! or an `@handle`.

use regex::Regex;
use std::sync::LazyLock;

static RE_PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:[a-z0-9-]+\.)*instagram\.com/([A-Za-z0-9_.]+)").unwrap()
});

static RE_BARE_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?([A-Za-z0-9_.]+)$").unwrap());

/// First path segments that are site structure, not accounts.
pub const RESERVED_SEGMENTS: &[&str] = &[
    "p", "reel", "reels", "stories", "explore", "direct", "accounts", "tv", "about", "share",
];

/// Extract a lowercase handle, or `None` when the input names no profile.
///
/// Never fails and performs no I/O. A bare handle comes back unchanged, so
/// `extract_handle(&h) == Some(h)` for every handle this returns.
pub fn extract_handle(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let cleaned = trimmed.split('?').next().unwrap_or(trimmed);

    if cleaned.to_lowercase().contains("instagram.com") {
        let caps = RE_PROFILE_URL.captures(cleaned)?;
        let handle = caps[1].to_lowercase();
        if RESERVED_SEGMENTS.contains(&handle.as_str()) {
            return None;
        }
        return Some(handle);
    }

    RE_BARE_HANDLE
        .captures(cleaned)
        .map(|caps| caps[1].to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_with_trailing_slash() {
        assert_eq!(
            extract_handle("https://instagram.com/artistone/"),
            Some("artistone".into())
        );
    }

    #[test]
    fn www_and_mixed_case() {
        assert_eq!(
            extract_handle("  https://www.Instagram.com/Artist.One  "),
            Some("artist.one".into())
        );
    }

    #[test]
    fn query_string_is_dropped() {
        assert_eq!(
            extract_handle("https://instagram.com/artistone/?hl=en"),
            Some("artistone".into())
        );
        assert_eq!(
            extract_handle("instagram.com/artistone?igshid=abc123"),
            Some("artistone".into())
        );
    }

    #[test]
    fn deeper_paths_use_first_segment() {
        assert_eq!(
            extract_handle("https://instagram.com/artistone/tagged/"),
            Some("artistone".into())
        );
    }

    #[test]
    fn reserved_segments_are_not_profiles() {
        for segment in RESERVED_SEGMENTS {
            let url = format!("https://instagram.com/{segment}/abc123");
            assert_eq!(extract_handle(&url), None, "{url} should be unresolvable");
            let bare = format!("instagram.com/{segment}");
            assert_eq!(extract_handle(&bare), None, "{bare} should be unresolvable");
        }
    }

    #[test]
    fn reel_url_is_unresolvable() {
        assert_eq!(extract_handle("https://instagram.com/reel/abc123"), None);
    }

    #[test]
    fn domain_without_segment_is_unresolvable() {
        assert_eq!(extract_handle("https://instagram.com/"), None);
        assert_eq!(extract_handle("instagram.com"), None);
    }

    #[test]
    fn lookalike_hosts_are_unresolvable() {
        assert_eq!(extract_handle("https://notinstagram.com/foo"), None);
        assert_eq!(extract_handle("evil-instagram.com/foo"), None);
        assert_eq!(extract_handle("https://instagram.com.example.net/foo"), None);
        assert_eq!(
            extract_handle("http://m.instagram.com/artistone"),
            Some("artistone".into())
        );
    }

    #[test]
    fn bare_handles() {
        assert_eq!(extract_handle("@artist_two"), Some("artist_two".into()));
        assert_eq!(extract_handle("Artist_Two"), Some("artist_two".into()));
        assert_eq!(extract_handle(" dj.night.owl "), Some("dj.night.owl".into()));
    }

    #[test]
    fn extraction_is_idempotent_on_its_output() {
        for raw in [
            "https://instagram.com/ArtistOne/",
            "@Artist_Two",
            "dj.night.owl",
            "instagram.com/some_band?x=1",
        ] {
            let handle = extract_handle(raw).unwrap();
            assert_eq!(extract_handle(&handle), Some(handle.clone()));
        }
    }

    #[test]
    fn other_input_is_unresolvable() {
        assert_eq!(extract_handle(""), None);
        assert_eq!(extract_handle("   "), None);
        assert_eq!(extract_handle("@"), None);
        assert_eq!(extract_handle("not a handle"), None);
        assert_eq!(extract_handle("https://facebook.com/artistone"), None);
        assert_eq!(extract_handle("artist-one"), None);
    }
}
