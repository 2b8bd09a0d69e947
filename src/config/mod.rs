use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use std::env;

pub struct Config;

impl Config {
    fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_").split("_"))
    }

    pub fn jwt_secret() -> String {
        Self::figment()
            .extract_inner("jwt_secret")
            .unwrap_or_else(|_| "default-secret".to_string())
    }

    pub fn jwt_refresh_secret() -> String {
        Self::figment()
            .extract_inner("jwt_refresh_secret")
            .unwrap_or_else(|_| "default-refresh-secret".to_string())
    }

    pub fn jwt_expiry() -> i64 {
        Self::figment()
            .extract_inner("jwt_expiry")
            .unwrap_or(900)
    }

    pub fn jwt_refresh_expiry() -> i64 {
        Self::figment()
            .extract_inner("jwt_refresh_expiry")
            .unwrap_or(604800)
    }

    pub fn mongodb_uri() -> String {
        Self::figment()
            .extract_inner("mongodb_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017/gharbhada".to_string())
    }

    pub fn khalti_secret_key() -> Option<String> {
        Self::figment()
            .extract_inner("khalti_secret_key")
            .ok()
    }

    pub fn khalti_base_url() -> String {
        Self::figment()
            .extract_inner("khalti_base_url")
            .unwrap_or_else(|_| "https://dev.khalti.com/api/v2".to_string())
    }

    pub fn is_khalti_enabled() -> bool {
        Self::khalti_secret_key().is_some()
    }

    pub fn frontend_url() -> String {
        Self::figment()
            .extract_inner("frontend_url")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
    }

    /// Admin bootstrap pair. Both values must come from the environment or
    /// Rocket.toml; there is no in-source fallback.
    pub fn admin_email() -> Option<String> {
        Self::figment()
            .extract_inner("admin_email")
            .ok()
    }

    pub fn admin_password_hash() -> Option<String> {
        Self::figment()
            .extract_inner("admin_password_hash")
            .ok()
    }

    pub fn is_development() -> bool {
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());
        profile == "development"
    }
}
