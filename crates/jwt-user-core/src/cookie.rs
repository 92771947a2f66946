//! Cookie store interface
//!
//! The identity cookie is read from the request and written to the
//! response by the host. The core only sees this narrow interface.

use std::collections::HashMap;

use cookie::{Cookie, CookieJar};
use time::OffsetDateTime;

/// Identity cookie attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub path: String,
    pub domain: Option<String>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: "identity".to_string(),
            http_only: true,
            secure: true,
            path: "/".to_string(),
            domain: None,
        }
    }
}

impl CookieOptions {
    /// Build the identity cookie carrying `value`.
    ///
    /// `expire` is a Unix timestamp; 0 makes it a browser-session cookie.
    pub fn to_cookie(&self, value: impl Into<String>, expire: i64) -> IdentityCookie {
        IdentityCookie {
            name: self.name.clone(),
            value: value.into(),
            expire,
            http_only: self.http_only,
            secure: self.secure,
            path: self.path.clone(),
            domain: self.domain.clone(),
        }
    }
}

/// A cookie to be written to the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCookie {
    pub name: String,
    pub value: String,
    /// Unix timestamp, 0 for a browser-session cookie
    pub expire: i64,
    pub http_only: bool,
    pub secure: bool,
    pub path: String,
    pub domain: Option<String>,
}

/// Request/response cookie access
pub trait CookieStore {
    /// Raw value of the named request cookie
    fn get(&self, name: &str) -> Option<String>;

    /// Write a cookie to the response
    fn set(&mut self, cookie: IdentityCookie);

    /// Remove the cookie described by `options`
    fn remove(&mut self, options: &CookieOptions);
}

/// In-memory store, useful for tests and tooling
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieStore {
    cookies: HashMap<String, IdentityCookie>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw cookie value, as if sent by a browser
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let mut store = Self::new();
        store.cookies.insert(
            name.clone(),
            CookieOptions {
                name,
                ..CookieOptions::default()
            }
            .to_cookie(value, 0),
        );
        store
    }

    /// Full cookie including attributes
    pub fn cookie(&self, name: &str) -> Option<&IdentityCookie> {
        self.cookies.get(name)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).map(|c| c.value.clone())
    }

    fn set(&mut self, cookie: IdentityCookie) {
        self.cookies.insert(cookie.name.clone(), cookie);
    }

    fn remove(&mut self, options: &CookieOptions) {
        self.cookies.remove(&options.name);
    }
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        CookieJar::get(self, name).map(|c| c.value().to_string())
    }

    fn set(&mut self, cookie: IdentityCookie) {
        let mut builder = Cookie::build((cookie.name, cookie.value))
            .http_only(cookie.http_only)
            .secure(cookie.secure)
            .path(cookie.path);
        if let Some(domain) = cookie.domain {
            builder = builder.domain(domain);
        }
        if cookie.expire > 0 {
            match OffsetDateTime::from_unix_timestamp(cookie.expire) {
                Ok(at) => builder = builder.expires(at),
                Err(e) => tracing::warn!(expire = cookie.expire, "Cookie expiry out of range: {}", e),
            }
        }
        self.add(builder);
    }

    fn remove(&mut self, options: &CookieOptions) {
        let mut removal = Cookie::new(options.name.clone(), "");
        removal.set_path(options.path.clone());
        if let Some(domain) = &options.domain {
            removal.set_domain(domain.clone());
        }
        CookieJar::remove(self, removal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let options = CookieOptions::default();
        let mut store = MemoryCookieStore::new();
        assert!(store.get("identity").is_none());

        store.set(options.to_cookie("token", 4600));
        assert_eq!(store.get("identity").as_deref(), Some("token"));
        let cookie = store.cookie("identity").unwrap();
        assert_eq!(cookie.expire, 4600);
        assert!(cookie.http_only);
        assert!(cookie.secure);

        store.remove(&options);
        assert!(store.is_empty());
    }

    #[test]
    fn test_jar_store_sets_attributes() {
        let options = CookieOptions {
            secure: false,
            ..CookieOptions::default()
        };
        let mut jar = CookieJar::new();
        CookieStore::set(&mut jar, options.to_cookie("token", 4600));

        assert_eq!(CookieStore::get(&jar, "identity").as_deref(), Some("token"));
        let cookie = jar.get("identity").unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.expires_datetime().map(OffsetDateTime::unix_timestamp),
            Some(4600)
        );
    }

    #[test]
    fn test_jar_store_session_cookie_has_no_expiry() {
        let mut jar = CookieJar::new();
        CookieStore::set(&mut jar, CookieOptions::default().to_cookie("token", 0));
        assert!(jar.get("identity").unwrap().expires().is_none());
    }

    #[test]
    fn test_jar_store_remove() {
        let options = CookieOptions::default();
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new("identity", "token"));
        assert!(CookieStore::get(&jar, "identity").is_some());

        CookieStore::remove(&mut jar, &options);
        assert!(CookieStore::get(&jar, "identity").is_none());
        assert_eq!(jar.delta().count(), 1);
    }
}
