//! Alpha Vantage typed queries.
//!
//! This module builds Alpha Vantage queries and decodes their payloads:
//! - Latest quote via GLOBAL_QUOTE endpoint
//! - Daily equity series via TIME_SERIES_DAILY endpoint
//! - Intraday equity series via TIME_SERIES_INTRADAY endpoint
//!
//! Every request goes through the [`QuotaFallbackFetcher`], so a key that hits
//! its quota is replaced by the next one in the pool. Payload shape checks
//! happen here, after the fetch, never inside it.
//!
//! Note: Alpha Vantage free tier is limited to 25 API calls per day per key.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::errors::MarketDataError;
use crate::fetcher::QuotaFallbackFetcher;
use crate::models::{CredentialPool, QuerySpec, Quote};

pub const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Alpha Vantage client.
///
/// Pairs a shared fetcher with the key pool it should draw from.
#[derive(Clone)]
pub struct AlphaVantageClient {
    fetcher: Arc<QuotaFallbackFetcher>,
    pool: Arc<CredentialPool>,
    cancel: CancellationToken,
}

/// Bar size for TIME_SERIES_INTRADAY.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntradayInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl IntradayInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::ThirtyMinutes => "30min",
            Self::SixtyMinutes => "60min",
        }
    }
}

impl fmt::Display for IntradayInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntradayInterval {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1min" => Ok(Self::OneMinute),
            "5min" => Ok(Self::FiveMinutes),
            "15min" => Ok(Self::FifteenMinutes),
            "30min" => Ok(Self::ThirtyMinutes),
            "60min" => Ok(Self::SixtyMinutes),
            other => Err(MarketDataError::InvalidConfig(format!(
                "unsupported intraday interval: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// Error payload Alpha Vantage returns for calls it cannot serve.
///
/// Quota notices never get here: the fetcher's detector consumes them.
#[derive(Debug, Default, Deserialize)]
struct ApiNotice {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

/// OHLCV bar shared by the daily and intraday series
#[derive(Debug, Deserialize)]
struct SeriesBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// GLOBAL_QUOTE response
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "02. open")]
    open: Option<String>,
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
}

// ============================================================================
// AlphaVantageClient implementation
// ============================================================================

impl AlphaVantageClient {
    pub fn new(fetcher: Arc<QuotaFallbackFetcher>, pool: Arc<CredentialPool>) -> Self {
        Self {
            fetcher,
            pool,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort every request made by this client once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run an arbitrary query and return the raw payload.
    pub async fn query(&self, query: &QuerySpec) -> Result<Value, MarketDataError> {
        self.fetcher
            .fetch_with_cancel(query, &self.pool, &self.cancel)
            .await
            .into_result()
    }

    /// Latest quote using GLOBAL_QUOTE endpoint.
    pub async fn global_quote(&self, symbol: &str, currency: &str) -> Result<Quote, MarketDataError> {
        let query = QuerySpec::new()
            .with("function", "GLOBAL_QUOTE")
            .with("symbol", symbol);

        let payload = self.query(&query).await?;
        let quote = Self::parse_global_quote(payload, symbol, currency)?;

        debug!("Alpha Vantage: fetched latest quote for {}", symbol);
        Ok(quote)
    }

    /// Daily equity quotes using TIME_SERIES_DAILY endpoint.
    pub async fn daily_series(
        &self,
        symbol: &str,
        currency: &str,
    ) -> Result<Vec<Quote>, MarketDataError> {
        let query = QuerySpec::new()
            .with("function", "TIME_SERIES_DAILY")
            .with("symbol", symbol)
            .with("outputsize", "compact"); // 'full' is premium-only

        let payload = self.query(&query).await?;
        let quotes = Self::parse_series(
            payload,
            "Time Series (Daily)",
            symbol,
            currency,
            Self::parse_date,
        )?;

        debug!(
            "Alpha Vantage: fetched {} daily quotes for {}",
            quotes.len(),
            symbol
        );
        Ok(quotes)
    }

    /// Intraday equity quotes using TIME_SERIES_INTRADAY endpoint.
    pub async fn intraday_series(
        &self,
        symbol: &str,
        interval: IntradayInterval,
        currency: &str,
    ) -> Result<Vec<Quote>, MarketDataError> {
        let query = QuerySpec::new()
            .with("function", "TIME_SERIES_INTRADAY")
            .with("symbol", symbol)
            .with("interval", interval.as_str());

        let payload = self.query(&query).await?;
        let series_key = format!("Time Series ({})", interval);
        let quotes = Self::parse_series(
            payload,
            &series_key,
            symbol,
            currency,
            Self::parse_datetime,
        )?;

        debug!(
            "Alpha Vantage: fetched {} {} quotes for {}",
            quotes.len(),
            interval,
            symbol
        );
        Ok(quotes)
    }

    /// Check for API-level messages in a payload that got past the fetcher.
    fn check_api_error(payload: &Value) -> Result<(), MarketDataError> {
        let notice: ApiNotice = serde_json::from_value(payload.clone()).unwrap_or_default();

        if let Some(msg) = notice.error_message {
            // Check if it's a "not found" type error
            if msg.contains("Invalid API call") || msg.contains("not found") {
                return Err(MarketDataError::SymbolNotFound(msg));
            }
            return Err(MarketDataError::ProviderError { message: msg });
        }

        Ok(())
    }

    fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, MarketDataError> {
        serde_json::from_value(payload).map_err(|e| MarketDataError::ProviderError {
            message: format!("Failed to parse response: {}", e),
        })
    }

    fn parse_global_quote(
        payload: Value,
        symbol: &str,
        currency: &str,
    ) -> Result<Quote, MarketDataError> {
        Self::check_api_error(&payload)?;

        let response: GlobalQuoteResponse = Self::decode(payload)?;
        // Unknown symbols come back as an empty "Global Quote" object
        let quote = response
            .global_quote
            .filter(|q| q.symbol.is_some())
            .ok_or_else(|| MarketDataError::SymbolNotFound(format!("No quote for symbol: {}", symbol)))?;

        let close = quote
            .price
            .as_deref()
            .and_then(Self::parse_decimal)
            .ok_or_else(|| MarketDataError::ProviderError {
                message: format!("Missing price for symbol: {}", symbol),
            })?;
        let timestamp = quote
            .latest_trading_day
            .as_deref()
            .and_then(Self::parse_date)
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            timestamp,
            open: quote.open.as_deref().and_then(Self::parse_decimal),
            high: quote.high.as_deref().and_then(Self::parse_decimal),
            low: quote.low.as_deref().and_then(Self::parse_decimal),
            close,
            volume: quote.volume.as_deref().and_then(Self::parse_decimal),
            currency: currency.to_string(),
            source: PROVIDER_ID.to_string(),
        })
    }

    /// Decode a `"Time Series (...)"` object into quotes sorted ascending.
    ///
    /// Bars whose timestamp or prices do not parse are skipped.
    fn parse_series(
        payload: Value,
        series_key: &str,
        symbol: &str,
        currency: &str,
        parse_timestamp: fn(&str) -> Option<DateTime<Utc>>,
    ) -> Result<Vec<Quote>, MarketDataError> {
        Self::check_api_error(&payload)?;

        let series = match payload {
            Value::Object(mut obj) => obj.remove(series_key),
            _ => None,
        }
        .ok_or_else(|| MarketDataError::SymbolNotFound(format!("No data for symbol: {}", symbol)))?;

        let bars: HashMap<String, SeriesBar> = Self::decode(series)?;

        let mut quotes: Vec<Quote> = bars
            .into_iter()
            .filter_map(|(stamp, bar)| {
                let timestamp = parse_timestamp(&stamp)?;
                let open = Self::parse_decimal(&bar.open)?;
                let high = Self::parse_decimal(&bar.high)?;
                let low = Self::parse_decimal(&bar.low)?;
                let close = Self::parse_decimal(&bar.close)?;
                let volume = Self::parse_decimal(&bar.volume)?;

                Some(Quote::ohlcv(
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume,
                    currency.to_string(),
                    PROVIDER_ID.to_string(),
                ))
            })
            .collect();

        // Sort by timestamp ascending
        quotes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        Ok(quotes)
    }

    /// Parse a date string in YYYY-MM-DD format to DateTime<Utc>.
    fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|dt| Utc.from_local_datetime(&dt).single())
    }

    /// Parse an intraday stamp in `YYYY-MM-DD HH:MM:SS` format.
    fn parse_datetime(stamp: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
            .ok()
            .and_then(|dt| Utc.from_local_datetime(&dt).single())
    }

    /// Parse a decimal value from a string.
    fn parse_decimal(s: &str) -> Option<Decimal> {
        Decimal::from_str(s).ok()
    }
}
