use thiserror::Error;

/// Error types for the quote relay pipeline
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required credential is missing or empty
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Requested symbol is not 1-5 ASCII letters
    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),
    /// Provider returned the empty-quote payload for this symbol
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
    /// Provider body was not the expected JSON shape
    #[error("malformed provider response: {0}")]
    UpstreamFormat(String),
    /// Provider could not be reached or answered with an error status
    #[error("quote provider unavailable: {0}")]
    QuoteUnavailable(String),
    /// Provider rate limit hit
    #[error("rate limit exceeded")]
    RateLimited,
    /// An outbound call exceeded its deadline
    #[error("{0} timed out")]
    Timeout(&'static str),
    /// Messaging call failed after exhausting retries
    #[error("notification delivery failed after {attempts} attempt(s): {reason}")]
    NotificationDelivery { attempts: u32, reason: String },
}

impl RelayError {
    /// HTTP status for each error kind. Consulted once at the response boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Configuration(_) => 500,
            RelayError::InvalidSymbol(_) => 400,
            RelayError::SymbolNotFound(_) => 404,
            RelayError::UpstreamFormat(_) => 502,
            RelayError::QuoteUnavailable(_) => 502,
            RelayError::RateLimited => 429,
            RelayError::Timeout(_) => 504,
            RelayError::NotificationDelivery { .. } => 502,
        }
    }

    /// Whether a best-effort alert message should be posted to the chat.
    ///
    /// Invalid and not-found symbols must not trigger any messaging call, and
    /// a delivery failure means the channel itself is down.
    pub fn should_alert(&self) -> bool {
        !matches!(
            self,
            RelayError::InvalidSymbol(_)
                | RelayError::SymbolNotFound(_)
                | RelayError::NotificationDelivery { .. }
        )
    }

    /// User-facing message, safe for production responses.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::Configuration(_) => {
                "Service configuration error. Please contact the administrator.".to_string()
            }
            RelayError::InvalidSymbol(_) => {
                "Invalid stock symbol. Use 1-5 letters, e.g. AAPL.".to_string()
            }
            RelayError::SymbolNotFound(symbol) => {
                format!("No quote data found for \"{symbol}\".")
            }
            RelayError::UpstreamFormat(_) | RelayError::QuoteUnavailable(_) => {
                "Quote provider is unavailable. Please try again later.".to_string()
            }
            RelayError::RateLimited => {
                "Rate limit exceeded. Please wait a moment before trying again.".to_string()
            }
            RelayError::Timeout(_) => "Upstream request timed out. Please try again.".to_string(),
            RelayError::NotificationDelivery { attempts, .. } => {
                format!("Failed to deliver notification after {attempts} attempt(s).")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::Configuration("x".into()).status_code(), 500);
        assert_eq!(RelayError::InvalidSymbol("x".into()).status_code(), 400);
        assert_eq!(RelayError::SymbolNotFound("X".into()).status_code(), 404);
        assert_eq!(RelayError::UpstreamFormat("x".into()).status_code(), 502);
        assert_eq!(RelayError::QuoteUnavailable("x".into()).status_code(), 502);
        assert_eq!(RelayError::RateLimited.status_code(), 429);
        assert_eq!(RelayError::Timeout("quote fetch").status_code(), 504);
        assert_eq!(
            RelayError::NotificationDelivery {
                attempts: 3,
                reason: "x".into()
            }
            .status_code(),
            502
        );
    }

    #[test]
    fn test_alert_policy() {
        assert!(RelayError::Configuration("x".into()).should_alert());
        assert!(RelayError::RateLimited.should_alert());
        assert!(RelayError::Timeout("quote fetch").should_alert());
        assert!(!RelayError::InvalidSymbol("x".into()).should_alert());
        assert!(!RelayError::SymbolNotFound("X".into()).should_alert());
        assert!(
            !RelayError::NotificationDelivery {
                attempts: 3,
                reason: "x".into()
            }
            .should_alert()
        );
    }

    #[test]
    fn test_display() {
        let err = RelayError::NotificationDelivery {
            attempts: 3,
            reason: "bad gateway".into(),
        };
        assert_eq!(
            format!("{err}"),
            "notification delivery failed after 3 attempt(s): bad gateway"
        );
        assert_eq!(format!("{}", RelayError::RateLimited), "rate limit exceeded");
    }

    #[test]
    fn test_user_message_hides_detail() {
        let err = RelayError::UpstreamFormat("expected value at line 1".into());
        assert!(!err.user_message().contains("line 1"));
    }
}
