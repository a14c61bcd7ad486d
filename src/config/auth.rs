use std::env;

#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    pub require_email_verification: bool,
    pub registration_enabled: bool,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            require_email_verification: parse_bool_env("REQUIRE_EMAIL_VERIFICATION", false),
            registration_enabled: parse_bool_env("REGISTRATION_ENABLED", true),
        }
    }
}

fn parse_bool_env(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|v| {
            let v = v.trim().to_ascii_lowercase();
            match v.as_str() {
                "1" | "true" | "yes" | "y" | "on" => Some(true),
                "0" | "false" | "no" | "n" | "off" => Some(false),
                _ => None,
            }
        })
        .unwrap_or(default)
}
