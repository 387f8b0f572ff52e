use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::cache::QuoteCache;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::notify::Notifier;
use crate::quote::{Quote, QuoteProvider};
use crate::retry::{linear_backoff, retry_with_backoff};

/// Caller-visible response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<QuoteData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw (unrounded) quote fields as returned to the caller and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    pub symbol: String,
    pub current_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    pub percent_change: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl RelayResponse {
    fn success(quote: &Quote, processed_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            message: format!("Quote for {} sent to Telegram", quote.symbol),
            data: Some(QuoteData {
                symbol: quote.symbol.clone(),
                current_price: quote.current,
                high: quote.high,
                low: quote.low,
                open: quote.open,
                previous_close: quote.previous_close,
                percent_change: quote.percent_change,
                timestamp: quote.timestamp.unwrap_or(processed_at),
            }),
            error: None,
        }
    }

    fn failure(err: &RelayError, expose_detail: bool) -> Self {
        Self {
            success: false,
            message: err.user_message(),
            data: None,
            error: expose_detail.then(|| err.to_string()),
        }
    }
}

/// The quote relay handler: validates the request, consults the cache,
/// fetches the quote, formats the summary and dispatches it to the chat.
pub struct RelayService {
    config: RelayConfig,
    provider: Box<dyn QuoteProvider>,
    notifier: Box<dyn Notifier>,
    cache: QuoteCache,
}

impl RelayService {
    /// The cache is passed in rather than held at process scope so its
    /// lifetime is tied to the service and tests can supply their own.
    pub fn new(
        config: RelayConfig,
        provider: Box<dyn QuoteProvider>,
        notifier: Box<dyn Notifier>,
        cache: QuoteCache,
    ) -> Self {
        Self {
            config,
            provider,
            notifier,
            cache,
        }
    }

    /// Build the production wiring: Finnhub provider + Telegram notifier.
    pub fn from_config(config: RelayConfig) -> Result<Self, RelayError> {
        let provider = crate::quote::FinnhubProvider::new(
            config.quote_api_key.clone(),
            config.quote_timeout,
        )?;
        let notifier =
            crate::notify::TelegramNotifier::new(&config.bot_token, config.notify_timeout);
        let cache = QuoteCache::new(config.cache_ttl);
        Ok(Self::new(config, Box::new(provider), Box::new(notifier), cache))
    }

    /// Run the full pipeline for one request and produce the HTTP-equivalent
    /// status plus response body. Never fails: every error becomes a
    /// structured failure response.
    pub async fn handle(&self, raw_symbol: Option<&str>) -> (u16, RelayResponse) {
        match self.process(raw_symbol).await {
            Ok(response) => (200, response),
            Err(err) => {
                error!("request failed: {err}");
                if err.should_alert() {
                    self.send_error_alert(&err).await;
                }
                (
                    err.status_code(),
                    RelayResponse::failure(&err, !self.config.production),
                )
            }
        }
    }

    async fn process(&self, raw_symbol: Option<&str>) -> Result<RelayResponse, RelayError> {
        self.config.validate()?;
        let symbol = normalize_symbol(raw_symbol.unwrap_or_default())?;

        if let Some(cached) = self.cache.get(&symbol).await {
            info!("cache hit for {symbol}");
            return Ok(cached);
        }

        info!("fetching quote for {symbol}");
        let quote = self.provider.fetch_quote(&symbol).await?;
        if quote.indicates_no_data() {
            return Err(RelayError::SymbolNotFound(symbol));
        }

        let processed_at = Utc::now();
        let text = format_quote_message(&quote, processed_at);
        self.dispatch_notification(&text).await?;
        info!("quote for {symbol} delivered to chat {}", self.config.chat_id);

        let response = RelayResponse::success(&quote, processed_at);
        self.cache.insert(symbol, response.clone()).await;
        Ok(response)
    }

    /// Notification send with retry. Retries never apply to the quote call.
    async fn dispatch_notification(&self, text: &str) -> Result<(), RelayError> {
        let attempts = self.config.notify_max_attempts;
        retry_with_backoff(
            attempts,
            linear_backoff(self.config.notify_backoff_step),
            || self.notifier.send_message(&self.config.chat_id, text),
        )
        .await
        .map_err(|err| match err {
            timeout @ RelayError::Timeout(_) => timeout,
            RelayError::NotificationDelivery { reason, .. } => {
                RelayError::NotificationDelivery { attempts, reason }
            }
            other => RelayError::NotificationDelivery {
                attempts,
                reason: other.to_string(),
            },
        })
    }

    /// Single-shot failure alert to the same chat. Its own failure is logged
    /// and never escalates past this boundary.
    async fn send_error_alert(&self, err: &RelayError) {
        let text = format!("⚠️ *Quote Relay Error*\n{err}");
        if let Err(alert_err) = self.notifier.send_message(&self.config.chat_id, &text).await {
            log::warn!("error alert delivery failed: {alert_err}");
        }
    }
}

/// Case-normalize and validate a requested symbol: 1-5 ASCII letters.
pub fn normalize_symbol(raw: &str) -> Result<String, RelayError> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() || symbol.len() > 5 || !symbol.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(RelayError::InvalidSymbol(raw.trim().to_string()));
    }
    Ok(symbol)
}

/// Render the chat summary for a quote. Pure: the fallback timestamp for
/// providers that omit one is passed in by the caller.
pub fn format_quote_message(quote: &Quote, processed_at: DateTime<Utc>) -> String {
    let (arrow, change_part) = match quote.percent_change {
        Some(p) if p >= 0.0 => ("📈", format!("+{p:.2}%")),
        Some(p) => ("📉", format!("{p:.2}%")),
        None => ("➡️", "N/A".to_string()),
    };
    let delta = match quote.previous_close {
        Some(pc) => format!("{:+.2}", quote.current - pc),
        None => "N/A".to_string(),
    };

    let mut message = format!(
        "{arrow} *{}* ${:.2} {change_part} ({delta})\nOpen: {}\nHigh: {}\nLow: {}\nPrev Close: {}",
        quote.symbol,
        quote.current,
        fmt_usd(quote.open),
        fmt_usd(quote.high),
        fmt_usd(quote.low),
        fmt_usd(quote.previous_close),
    );

    if quote.previous_close == Some(quote.current) {
        message.push_str("\n_Market appears closed_");
    }

    let timestamp = quote.timestamp.unwrap_or(processed_at);
    message.push_str(&format!(
        "\nLast Updated: {}",
        timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    message
}

fn fmt_usd(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${v:.2}"),
        None => "N/A".to_string(),
    }
}
