pub mod error;
pub mod types;

pub use error::{InstagramError, Result};
pub use types::ProfileInfo;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use types::WebProfileResponse;

pub const DEFAULT_BASE_URL: &str = "https://i.instagram.com";

/// App id sent by instagram.com's own web client. Public, not a credential.
pub const DEFAULT_APP_ID: &str = "936619743392459";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in `Api` / `RateLimited` messages.
const MAX_MESSAGE_CHARS: usize = 200;

pub struct InstagramClient {
    client: reqwest::Client,
    base_url: String,
}

impl InstagramClient {
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_BASE_URL, DEFAULT_APP_ID)
    }

    /// Build a client against a different host (proxy, mirror) or app id.
    pub fn with_options(base_url: &str, app_id: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-ig-app-id",
            HeaderValue::from_str(app_id)
                .map_err(|e| InstagramError::Config(format!("invalid app id: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up a public profile by username. One request, no caching.
    pub async fn profile(&self, username: &str) -> Result<ProfileInfo> {
        let url = format!("{}/api/v1/users/web_profile_info/", self.base_url);
        tracing::debug!(username, "Fetching Instagram profile");

        let resp = self
            .client
            .get(&url)
            .query(&[("username", username)])
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        classify_response(status, &body, username)
    }
}

/// Map an HTTP status and body onto a profile or a typed failure.
pub(crate) fn classify_response(status: u16, body: &str, username: &str) -> Result<ProfileInfo> {
    if status == 404 {
        return Err(InstagramError::NotFound(username.to_string()));
    }

    let success = (200..300).contains(&status);
    if status == 429 || (!success && looks_rate_limited(body)) {
        return Err(InstagramError::RateLimited {
            status,
            message: truncate(body),
        });
    }
    if !success {
        return Err(InstagramError::Api {
            status,
            message: truncate(body),
        });
    }

    let resp: WebProfileResponse = serde_json::from_str(body)?;
    match resp.data.and_then(|d| d.user) {
        Some(user) => Ok(user.into()),
        None => {
            let message = resp.message.unwrap_or_default();
            if resp.status.as_deref() == Some("fail") && looks_rate_limited(&message) {
                Err(InstagramError::RateLimited { status, message })
            } else {
                Err(InstagramError::NotFound(username.to_string()))
            }
        }
    }
}

/// Instagram signals throttling with 429, or with 401/"fail" bodies asking
/// the caller to wait.
pub fn looks_rate_limited(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("rate limit")
        || lower.contains("ratelimit")
        || lower.contains("too many requests")
        || lower.contains("please wait a few minutes")
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_MESSAGE_CHARS).collect()
}
