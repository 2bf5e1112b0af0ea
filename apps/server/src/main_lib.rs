use std::sync::Arc;

use tickertrack_market_data::{
    AlphaVantageClient, CancellationToken, CredentialPool, FetcherConfig, QuotaFallbackFetcher,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{AuthProvider, HostedAuthClient};
use crate::config::Config;

pub struct AppState {
    pub fetcher: Arc<QuotaFallbackFetcher>,
    pub pool: Arc<CredentialPool>,
    pub alpha_vantage: AlphaVantageClient,
    pub auth: Option<Arc<dyn AuthProvider>>,
    /// Cancelled on shutdown; aborts in-flight market data fetches.
    pub shutdown: CancellationToken,
}

pub fn init_tracing() {
    let log_format = std::env::var("TT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let pool = Arc::new(CredentialPool::from_delimited(&config.market_data.api_keys)?);

    let mut fetcher_config = FetcherConfig {
        attempt_timeout: config.market_data.attempt_timeout,
        ..FetcherConfig::default()
    };
    if let Some(base_url) = &config.market_data.base_url {
        fetcher_config.base_url = base_url.clone();
    }
    let fetcher = Arc::new(QuotaFallbackFetcher::alpha_vantage(fetcher_config)?);
    tracing::info!(
        "Market data: {} API key(s) against {}",
        pool.len(),
        fetcher.config().base_url
    );

    let shutdown = CancellationToken::new();
    let alpha_vantage =
        AlphaVantageClient::new(fetcher.clone(), pool.clone()).with_cancel(shutdown.clone());

    let auth: Option<Arc<dyn AuthProvider>> = match &config.auth {
        Some(auth_config) => {
            tracing::info!("Auth backend: {}", auth_config.url);
            Some(Arc::new(HostedAuthClient::new(auth_config)))
        }
        None => {
            tracing::info!("Auth backend not configured; auth routes are disabled");
            None
        }
    };

    Ok(Arc::new(AppState {
        fetcher,
        pool,
        alpha_vantage,
        auth,
        shutdown,
    }))
}
