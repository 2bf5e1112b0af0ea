use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub market_data: MarketDataConfig,
    pub auth: Option<AuthConfig>,
}

pub struct MarketDataConfig {
    /// Raw comma-separated key list, in fallback order
    pub api_keys: String,
    pub base_url: Option<String>,
    pub attempt_timeout: Duration,
}

/// Hosted authentication backend; auth routes answer 501 without it.
#[derive(Clone)]
pub struct AuthConfig {
    pub url: String,
    pub anon_key: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let listen_addr: SocketAddr = var("TT_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid TT_LISTEN_ADDR")?;
        let cors_allow = var("TT_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let request_timeout = millis(var("TT_REQUEST_TIMEOUT_MS"), 30000);

        let api_keys = var("TT_MARKET_DATA_API_KEYS")
            .context("TT_MARKET_DATA_API_KEYS must list at least one API key")?;
        let market_data = MarketDataConfig {
            api_keys,
            base_url: var("TT_MARKET_DATA_BASE_URL"),
            attempt_timeout: millis(var("TT_MARKET_DATA_ATTEMPT_TIMEOUT_MS"), 30000),
        };

        let auth = match (var("TT_AUTH_URL"), var("TT_AUTH_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(AuthConfig { url, anon_key }),
            (None, None) => None,
            _ => anyhow::bail!("TT_AUTH_URL and TT_AUTH_ANON_KEY must be set together"),
        };

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout,
            market_data,
            auth,
        })
    }
}

fn millis(raw: Option<String>, default: u64) -> Duration {
    let ms = raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default);
    Duration::from_millis(ms)
}
