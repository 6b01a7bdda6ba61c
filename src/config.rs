//! Application configuration.
//!
//! Only one knob matters: where the closet services live. Mirrors the
//! original deployment where the UI reads the server URL from the
//! environment at startup.

const SERVER_URL_VAR: &str = "OUTFIT_STUDIO_SERVER";
const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Base URL of the closet services, from `OUTFIT_STUDIO_SERVER` or the
/// localhost default.
pub fn server_url() -> String {
    match std::env::var(SERVER_URL_VAR) {
        Ok(url) if !url.trim().is_empty() => url,
        _ => DEFAULT_SERVER_URL.to_string(),
    }
}
