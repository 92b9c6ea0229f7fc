use std::{
    env::{self, VarError},
    str::FromStr,
};

use crate::subscription::UnsubscribeScope;

const DEFAULT_TDX_API_URL: &str = "https://tdx.transportdata.tw/api/basic/v2/";
const DEFAULT_TDX_AUTH_URL: &str =
    "https://tdx.transportdata.tw/auth/realms/TDXConnect/protocol/openid-connect/token";
const DEFAULT_POLL_INTERVAL: u64 = 60;
const DEFAULT_APPROACH_THRESHOLD: u32 = 5;

/// Represents the application configuration.
#[derive(Debug)]
pub struct Config {
    /// The client id registered on the transit data platform.
    pub tdx_client_id: String,
    /// The client secret registered on the transit data platform.
    pub tdx_client_secret: String,
    /// The base URL of the transit data API.
    pub tdx_api_url: String,
    /// The token endpoint used for the client-credentials grant.
    pub tdx_auth_url: String,
    /// The Telegram bot token.
    pub telegram_bot_token: String,
    /// The interval in seconds between two checks of the same subscription.
    pub poll_interval: u64,
    /// Distance alerts fire when the nearest bus is fewer stops away than this.
    pub approach_threshold: u32,
    /// Which tasks `/unsubscribe` cancels.
    pub unsubscribe_scope: UnsubscribeScope,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    pub fn from_env() -> Result<Self, VarError> {
        Ok(Self {
            tdx_client_id: env::var("TDX_CLIENT_ID")?,
            tdx_client_secret: env::var("TDX_CLIENT_SECRET")?,
            tdx_api_url: env::var("TDX_API_URL")
                .unwrap_or_else(|_| DEFAULT_TDX_API_URL.to_string()),
            tdx_auth_url: env::var("TDX_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_TDX_AUTH_URL.to_string()),
            telegram_bot_token: env::var("TELEGRAM_SECRET")?,
            poll_interval: parse_or("POLL_INTERVAL", DEFAULT_POLL_INTERVAL),
            approach_threshold: parse_or("APPROACH_THRESHOLD", DEFAULT_APPROACH_THRESHOLD),
            unsubscribe_scope: parse_or("UNSUBSCRIBE_SCOPE", UnsubscribeScope::default()),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
