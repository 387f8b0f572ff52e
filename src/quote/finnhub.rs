use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use super::provider::{Quote, QuoteProvider};
use crate::error::RelayError;

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Wire shape of the provider's `/quote` endpoint. Every field is optional so
/// a sparse body degrades to placeholders instead of a parse failure; a wrong
/// type anywhere is still rejected.
#[derive(Debug, Deserialize)]
struct RawQuote {
    /// Current price
    c: Option<f64>,
    /// Daily high
    h: Option<f64>,
    /// Daily low
    l: Option<f64>,
    /// Opening price
    o: Option<f64>,
    /// Previous close
    pc: Option<f64>,
    /// Percent change from previous close
    dp: Option<f64>,
    /// Quote time as unix seconds, 0 when the provider has none
    t: Option<i64>,
}

/// Finnhub market data provider
pub struct FinnhubProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FinnhubProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Configuration(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn parse_body(symbol: &str, body: &str) -> Result<Quote, RelayError> {
        let raw: RawQuote = serde_json::from_str(body)
            .map_err(|e| RelayError::UpstreamFormat(format!("quote body for {symbol}: {e}")))?;
        let current = raw.c.ok_or_else(|| {
            RelayError::UpstreamFormat(format!("quote body for {symbol} missing current price"))
        })?;
        Ok(Quote {
            symbol: symbol.to_string(),
            current,
            high: raw.h,
            low: raw.l,
            open: raw.o,
            previous_close: raw.pc,
            percent_change: raw.dp,
            timestamp: raw
                .t
                .filter(|&t| t > 0)
                .and_then(|t| DateTime::from_timestamp(t, 0)),
        })
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn name(&self) -> &'static str {
        "Finnhub"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, RelayError> {
        let url = format!("{}/quote", self.base_url);
        log::debug!("GET {url}?symbol={symbol}");

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(map_transport_error)?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RelayError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(RelayError::QuoteUnavailable(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(map_transport_error)?;
        Self::parse_body(symbol, &body)
    }
}

fn map_transport_error(err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        RelayError::Timeout("quote fetch")
    } else {
        RelayError::QuoteUnavailable(err.to_string())
    }
}
