use axum::http::{header, HeaderMap};
use std::{env, sync::OnceLock};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone)]
struct AuthCookieConfig {
    secure: bool,
    same_site: &'static str,
    domain: Option<String>,
}

impl AuthCookieConfig {
    fn from_env() -> Self {
        let same_site = match env::var("AUTH_COOKIE_SAMESITE")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "strict" => "Strict",
            "none" => "None",
            _ => "Lax",
        };

        let secure = env::var("AUTH_COOKIE_SECURE")
            .ok()
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => Some(true),
                "0" | "false" | "no" | "n" | "off" => Some(false),
                _ => None,
            })
            // Browsers require SameSite=None cookies to also be Secure.
            .unwrap_or(false)
            || same_site == "None";

        let domain = env::var("AUTH_COOKIE_DOMAIN")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Self {
            secure,
            same_site,
            domain,
        }
    }

    fn write_attributes(&self, cookie: &mut String) {
        cookie.push_str("; HttpOnly; SameSite=");
        cookie.push_str(self.same_site);
        if self.secure {
            cookie.push_str("; Secure");
        }
        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
    }
}

fn auth_cookie_config() -> &'static AuthCookieConfig {
    static CONFIG: OnceLock<AuthCookieConfig> = OnceLock::new();
    CONFIG.get_or_init(AuthCookieConfig::from_env)
}

pub fn build_auth_cookie(name: &str, value: &str, max_age_seconds: u64) -> String {
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age_seconds}");
    auth_cookie_config().write_attributes(&mut cookie);
    cookie
}

pub fn build_clear_cookie(name: &str) -> String {
    let mut cookie =
        format!("{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
    auth_cookie_config().write_attributes(&mut cookie);
    cookie
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie_header| {
            cookie_header.split(';').find_map(|cookie| {
                let (key, value) = cookie.trim().split_once('=')?;
                if key.trim() == name {
                    Some(value.trim().to_string())
                } else {
                    None
                }
            })
        })
}
