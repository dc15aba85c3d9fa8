//! Session cookie encoding and `Cookie` header parsing.

use std::collections::HashMap;
use std::fmt;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "el_session";

/// Default cookie lifetime, matching the session TTL (14 days)
pub const DEFAULT_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// `SameSite` attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Attributes attached to a `Set-Cookie` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    /// Lifetime in seconds; zero or negative clears the cookie
    pub max_age: i64,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: DEFAULT_MAX_AGE_SECS,
        }
    }
}

impl CookieOptions {
    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

/// Build a `Set-Cookie` header value
pub fn encode_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut parts = vec![format!("{name}={}", urlencoding::encode(value))];

    if options.max_age > 0 {
        parts.push(format!("Max-Age={}", options.max_age));
    } else {
        parts.push("Max-Age=0".to_string());
        parts.push(format!("Expires={EPOCH_HTTP_DATE}"));
    }
    if !options.path.is_empty() {
        parts.push(format!("Path={}", options.path));
    }
    if options.http_only {
        parts.push("HttpOnly".to_string());
    }
    if options.secure {
        parts.push("Secure".to_string());
    }
    parts.push(format!("SameSite={}", options.same_site));

    parts.join("; ")
}

/// `Set-Cookie` value that removes the named cookie
pub fn clear_cookie(name: &str, options: &CookieOptions) -> String {
    encode_cookie(name, "", &options.clone().with_max_age(0))
}

/// Parse a `Cookie` request header into name/value pairs.
///
/// Malformed segments are skipped; the first occurrence of a name wins.
pub fn decode_cookies(header: Option<&str>) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    let Some(header) = header else {
        return cookies;
    };

    for segment in header.split(';') {
        let segment = segment.trim();
        let (name, raw) = segment.split_once('=').unwrap_or((segment, ""));
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let raw = raw.trim();
        let value = urlencoding::decode(raw)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw.to_string());

        cookies.entry(name.to_string()).or_insert(value);
    }

    cookies
}

/// Pull the session token out of a `Cookie` header
pub fn session_token(header: Option<&str>) -> Option<String> {
    decode_cookies(header)
        .remove(SESSION_COOKIE)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_defaults() {
        let cookie = encode_cookie(SESSION_COOKIE, "abc123", &CookieOptions::default());
        assert_eq!(
            cookie,
            "el_session=abc123; Max-Age=1209600; Path=/; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_encode_without_flags() {
        let options = CookieOptions {
            http_only: false,
            secure: false,
            same_site: SameSite::Strict,
            path: "/admin".to_string(),
            max_age: 60,
        };
        assert_eq!(
            encode_cookie("pref", "dark", &options),
            "pref=dark; Max-Age=60; Path=/admin; SameSite=Strict"
        );
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = clear_cookie(SESSION_COOKIE, &CookieOptions::default());
        assert!(cookie.starts_with("el_session=; Max-Age=0; Expires=Thu, 01 Jan 1970"));
        assert!(cookie.contains("HttpOnly"));

        let negative = encode_cookie("x", "y", &CookieOptions::default().with_max_age(-5));
        assert!(negative.contains("Max-Age=0"));
    }

    #[test]
    fn test_value_is_percent_encoded() {
        let cookie = encode_cookie("n", "a;b=c d", &CookieOptions::default());
        assert!(cookie.starts_with("n=a%3Bb%3Dc%20d;"));
    }

    #[test]
    fn test_round_trip_reserved_characters() {
        let value = "semi;colon=equals and space";
        let set_cookie = encode_cookie("n", value, &CookieOptions::default());
        // A browser echoes back only the name=value pair.
        let pair = set_cookie.split("; ").next().unwrap();

        assert_eq!(decode_cookies(Some(pair)).get("n").map(String::as_str), Some(value));
    }

    #[test]
    fn test_decode_absent_and_empty() {
        assert!(decode_cookies(None).is_empty());
        assert!(decode_cookies(Some("")).is_empty());
        assert!(decode_cookies(Some(" ; ;; ")).is_empty());
    }

    #[test]
    fn test_decode_skips_malformed_segments() {
        let cookies = decode_cookies(Some("=orphan; a=1;  b = 2 ; flag; c=x=y; bad=%E0%A4%A"));
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("2"));
        assert_eq!(cookies.get("flag").map(String::as_str), Some(""));
        assert_eq!(cookies.get("c").map(String::as_str), Some("x=y"));
        assert_eq!(cookies.get("bad").map(String::as_str), Some("%E0%A4%A"));
        assert!(!cookies.contains_key(""));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let cookies = decode_cookies(Some("el_session=first; el_session=second"));
        assert_eq!(cookies.get(SESSION_COOKIE).map(String::as_str), Some("first"));
    }

    #[test]
    fn test_session_token() {
        assert_eq!(
            session_token(Some("theme=dark; el_session=tok")),
            Some("tok".to_string())
        );
        assert_eq!(session_token(Some("el_session=")), None);
        assert_eq!(session_token(None), None);
    }
}
