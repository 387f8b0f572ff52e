use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RelayError;

/// Snapshot of a symbol's price fields for the current trading day.
///
/// Everything except the current price is optional on the wire; absent fields
/// are carried as `None` and rendered as placeholders downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Ticker symbol, normalized to uppercase (e.g. "AAPL")
    pub symbol: String,
    /// Current price
    pub current: f64,
    /// Daily high
    pub high: Option<f64>,
    /// Daily low
    pub low: Option<f64>,
    /// Opening price
    pub open: Option<f64>,
    /// Previous closing price
    pub previous_close: Option<f64>,
    /// Percentage change from previous close; `None` only when the provider
    /// omitted it, a literal zero is a valid value
    pub percent_change: Option<f64>,
    /// Provider-reported quote time, when supplied
    pub timestamp: Option<DateTime<Utc>>,
}

impl Quote {
    /// The provider signals an unknown symbol with a zeroed payload rather
    /// than an error status.
    pub fn indicates_no_data(&self) -> bool {
        self.current == 0.0 && self.percent_change.is_none()
    }
}

/// Trait for market data providers
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch the current quote for a normalized symbol
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, RelayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_creation() {
        let quote = Quote {
            symbol: "AAPL".to_string(),
            current: 150.0,
            high: Some(151.0),
            low: Some(147.0),
            open: Some(148.0),
            previous_close: Some(147.5),
            percent_change: Some(1.69),
            timestamp: Some(Utc::now()),
        };

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.current, 150.0);
        assert!(!quote.indicates_no_data());
    }

    #[test]
    fn test_zeroed_payload_means_no_data() {
        let quote = Quote {
            symbol: "ZZZZZ".to_string(),
            current: 0.0,
            high: None,
            low: None,
            open: None,
            previous_close: None,
            percent_change: None,
            timestamp: None,
        };
        assert!(quote.indicates_no_data());
    }

    #[test]
    fn test_zero_price_with_percent_change_is_data() {
        // A genuinely worthless-but-listed symbol still carries a percent change
        let quote = Quote {
            symbol: "X".to_string(),
            current: 0.0,
            high: None,
            low: None,
            open: None,
            previous_close: None,
            percent_change: Some(0.0),
            timestamp: None,
        };
        assert!(!quote.indicates_no_data());
    }
}
