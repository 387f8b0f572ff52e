use std::env;
use std::sync::Arc;

use log::info;

use crate::relay::RelayService;

#[cfg(feature = "axum-server")]
use std::collections::HashMap;

#[cfg(feature = "axum-server")]
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};

#[cfg(feature = "lambda")]
use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
#[cfg(feature = "lambda")]
use serde_json::{Value, json};

/// CORS headers attached to every response, preflight included.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, OPTIONS"),
    ("access-control-allow-headers", "Content-Type"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Lambda,
    Server,
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Lambda => write!(f, "AWS LAMBDA"),
            DeploymentMode::Server => write!(f, "HTTP SERVER"),
        }
    }
}

pub fn is_lambda_environment() -> bool {
    // Check if running on AWS Lambda
    env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() ||
    env::var("LAMBDA_RUNTIME_API").is_ok() ||
    // Manual override
    env::var("LAMBDA_MODE").map(|v| v == "true").unwrap_or(false)
}

pub fn detect_deployment_mode() -> DeploymentMode {
    if is_lambda_environment() {
        DeploymentMode::Lambda
    } else {
        DeploymentMode::Server
    }
}

#[cfg(feature = "lambda")]
pub async fn run_lambda_mode(service: Arc<RelayService>) -> Result<(), Box<dyn std::error::Error>> {
    info!("☁️ AWS Lambda environment detected - setting up Lambda runtime");

    let handler = service_fn(move |event: LambdaEvent<Value>| {
        let service = Arc::clone(&service);
        async move { lambda_handler(service, event).await }
    });

    info!("👂 Lambda handler ready to receive requests!");
    lambda_runtime::run(handler)
        .await
        .map_err(|e| format!("Lambda runtime failed: {e}").into())
}

#[cfg(feature = "lambda")]
async fn lambda_handler(
    service: Arc<RelayService>,
    event: LambdaEvent<Value>,
) -> Result<Value, LambdaError> {
    let method = event
        .payload
        .get("httpMethod")
        .and_then(Value::as_str)
        .unwrap_or("GET");

    // CORS preflight short-circuits with no body and no outbound calls
    if method.eq_ignore_ascii_case("OPTIONS") {
        return Ok(gateway_response(200, String::new()));
    }

    let symbol = symbol_from_event(&event.payload);
    let (status, body) = service.handle(symbol).await;
    Ok(gateway_response(status, serde_json::to_string(&body)?))
}

#[cfg(feature = "lambda")]
fn symbol_from_event(payload: &Value) -> Option<&str> {
    payload
        .pointer("/queryStringParameters/symbol")
        .and_then(Value::as_str)
}

#[cfg(feature = "lambda")]
fn gateway_response(status: u16, body: String) -> Value {
    let mut headers = serde_json::Map::new();
    for (name, value) in CORS_HEADERS {
        headers.insert(name.to_string(), Value::String(value.to_string()));
    }
    headers.insert(
        "content-type".to_string(),
        Value::String("application/json".to_string()),
    );
    json!({
        "statusCode": status,
        "headers": headers,
        "body": body,
    })
}

#[cfg(feature = "axum-server")]
async fn health_check() -> impl IntoResponse {
    (CORS_HEADERS, "Quote relay is running!")
}

#[cfg(feature = "axum-server")]
async fn quote_endpoint(
    State(service): State<Arc<RelayService>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (status, body) = service.handle(params.get("symbol").map(String::as_str)).await;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, CORS_HEADERS, Json(body))
}

#[cfg(feature = "axum-server")]
async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, CORS_HEADERS)
}

#[cfg(feature = "axum-server")]
fn router(service: Arc<RelayService>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route(
            "/api/quote",
            get(quote_endpoint).post(quote_endpoint).options(preflight),
        )
        .with_state(service)
}

#[cfg(feature = "axum-server")]
pub async fn run_server_mode(service: Arc<RelayService>) -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|_| "PORT must be a valid number")?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| format!("Failed to bind to port: {e}"))?;

    info!("👂 Quote relay listening on port {port} - ready to receive requests!");

    axum::serve(listener, router(service))
        .await
        .map_err(|e| format!("Server failed: {e}").into())
}

/// Service wired with real backends and dummy credentials. Tests only send
/// requests that fail symbol validation, which makes no outbound call.
#[cfg(all(test, any(feature = "axum-server", feature = "lambda")))]
fn idle_service() -> Arc<RelayService> {
    use std::time::Duration;

    use crate::cache::QuoteCache;
    use crate::config::RelayConfig;
    use crate::notify::TelegramNotifier;
    use crate::quote::FinnhubProvider;

    let config = RelayConfig {
        quote_api_key: "test-key".to_string(),
        bot_token: "test-token".to_string(),
        chat_id: "-1001".to_string(),
        ..RelayConfig::default()
    };
    let provider = FinnhubProvider::new(String::new(), Duration::from_millis(10)).unwrap();
    let notifier = TelegramNotifier::new("", Duration::from_millis(10));
    let cache = QuoteCache::new(config.cache_ttl);
    Arc::new(RelayService::new(
        config,
        Box::new(provider),
        Box::new(notifier),
        cache,
    ))
}



#[cfg(all(test, feature = "lambda"))]
mod lambda_tests {
    use super::*;
    use lambda_runtime::Context;

    #[test]
    fn test_symbol_extraction_from_event() {
        let payload = json!({
            "httpMethod": "GET",
            "queryStringParameters": { "symbol": "AAPL" }
        });
        assert_eq!(symbol_from_event(&payload), Some("AAPL"));
        assert_eq!(symbol_from_event(&json!({"httpMethod": "GET"})), None);
    }

    #[tokio::test]
    async fn test_options_short_circuits_with_empty_body() {
        let event = LambdaEvent::new(json!({ "httpMethod": "OPTIONS" }), Context::default());
        let response = lambda_handler(idle_service(), event).await.unwrap();
        assert_eq!(response["statusCode"], 200);
        assert_eq!(response["body"], "");
        assert_eq!(response["headers"]["access-control-allow-origin"], "*");
    }

    #[test]
    fn test_gateway_response_carries_cors_headers() {
        let response = gateway_response(404, "{}".to_string());
        assert_eq!(response["statusCode"], 404);
        assert_eq!(
            response["headers"]["access-control-allow-methods"],
            "GET, POST, OPTIONS"
        );
        assert_eq!(response["headers"]["content-type"], "application/json");
    }
}
