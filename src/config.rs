//! read configuration from a file or the environment

use std::path::Path;

use crate::errors::Error;

#[derive(serde::Deserialize)]
pub struct Config {
    /// Base URL of the Selfie API, e.g. `https://selfie.example.com/api`.
    pub base_url: String,
    /// Session cookie for the authenticated user, sent verbatim on every request.
    pub session_cookie: String,
    /// Path of the JSON file holding the persisted clock offset.
    pub state_path: String,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn from_env() -> Result<Config, Error> {
        Ok(Config {
            base_url: std::env::var("SELFIE_API_URL")
                .map_err(|_| Error::Config("Missing SELFIE_API_URL env var".to_string()))?,
            session_cookie: std::env::var("SELFIE_SESSION_COOKIE")
                .map_err(|_| Error::Config("Missing SELFIE_SESSION_COOKIE env var".to_string()))?,
            state_path: std::env::var("SELFIE_STATE_PATH")
                .map_err(|_| Error::Config("Missing SELFIE_STATE_PATH env var".to_string()))?,
        })
    }
}
