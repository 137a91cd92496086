//! Session cookie helpers
//!
//! Both tokens travel as HttpOnly cookies and are always set or cleared together.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::CookieConfig;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "lax" => SameSite::Lax,
            "none" => SameSite::None,
            _ => SameSite::Strict,
        }
    }
}

/// Attributes shared by the access and refresh cookies
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl CookiePolicy {
    pub fn from_config(config: &CookieConfig) -> Self {
        Self {
            secure: config.secure,
            same_site: SameSite::parse(&config.same_site),
            path: "/".to_string(),
        }
    }

    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, name: &str, value: &str, max_age_secs: u64) -> String {
        let mut cookie = format!("{}={}; HttpOnly", name, value);

        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));
        cookie.push_str(&format!("; Max-Age={}", max_age_secs));

        cookie
    }

    /// Build Set-Cookie header for deletion (expired)
    pub fn build_delete_cookie(&self, name: &str) -> String {
        let mut cookie = format!("{}=; HttpOnly", name);

        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}; Max-Age=0", self.path));

        cookie
    }

    /// Append both session cookies to a response header map
    pub fn set_session_cookies(
        &self,
        headers: &mut HeaderMap,
        access_token: &str,
        access_max_age: u64,
        refresh_token: &str,
        refresh_max_age: u64,
    ) {
        append_set_cookie(
            headers,
            self.build_set_cookie(ACCESS_TOKEN_COOKIE, access_token, access_max_age),
        );
        append_set_cookie(
            headers,
            self.build_set_cookie(REFRESH_TOKEN_COOKIE, refresh_token, refresh_max_age),
        );
    }

    /// Append expiring versions of both session cookies
    pub fn clear_session_cookies(&self, headers: &mut HeaderMap) {
        append_set_cookie(headers, self.build_delete_cookie(ACCESS_TOKEN_COOKIE));
        append_set_cookie(headers, self.build_delete_cookie(REFRESH_TOKEN_COOKIE));
    }
}

fn append_set_cookie(headers: &mut HeaderMap, cookie: String) {
    // JWTs are URL-safe base64 so this only fails on a corrupted value
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Invalid Set-Cookie value: {}", e),
    }
}

/// Extract a cookie value from request headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;

            if key == name && !value.is_empty() {
                Some(value.to_string())
            } else {
                None
            }
        })
}
