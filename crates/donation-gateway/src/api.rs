/*!
# Backend Transport

Both providers are reached through the donation backend, which holds the
provider credentials. `PaymentApi` is the seam between the adapters and that
backend: `HttpPaymentApi` speaks JSON over HTTPS, the sandbox answers in memory.
*/

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::messages;
use async_trait::async_trait;
use donation_forms::PaymentMethod;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

pub const RAZORPAY_CREATE_ORDER: &str = "razorpay/create-order";
pub const RAZORPAY_VERIFY_PAYMENT: &str = "razorpay/verify-payment";
pub const PAYPAL_CREATE_ORDER: &str = "paypal/create-order";
pub const PAYPAL_CAPTURE_ORDER: &str = "paypal/capture-order";

#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// POST a JSON body to a backend path and return the decoded JSON response
    async fn post_json(&self, provider: PaymentMethod, path: &str, body: Value)
        -> GatewayResult<Value>;
}

pub struct HttpPaymentApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpPaymentApi {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let mut base_url = Url::parse(&config.api_base_url).map_err(|e| {
            GatewayError::Config(format!("Invalid api_base_url '{}': {}", config.api_base_url, e))
        })?;
        // Url::join replaces the last segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl PaymentApi for HttpPaymentApi {
    async fn post_json(
        &self,
        provider: PaymentMethod,
        path: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| GatewayError::Config(format!("Invalid endpoint path '{}': {}", path, e)))?;

        debug!(%url, provider = provider.as_str(), "POST");
        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                GatewayError::InvalidResponse(format!("{} returned invalid JSON: {}", url, e))
            });
        }

        warn!(%url, status = status.as_u16(), "Backend request failed");
        Err(classify_http_failure(provider, status.as_u16(), &text))
    }
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::InvalidResponse(err.to_string())
    } else {
        GatewayError::Network(err.to_string())
    }
}

/// Turn a non-2xx backend response into a `GatewayError`
///
/// Provider error bodies are forwarded by the backend unchanged:
/// Razorpay `{"error": {"code", "description"}}`,
/// PayPal `{"name", "message", "details": [{"issue", "description"}]}`.
pub fn classify_http_failure(provider: PaymentMethod, status: u16, body: &str) -> GatewayError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let provider_error = parsed
        .as_ref()
        .and_then(|json| extract_provider_error(provider, json));

    match provider_error {
        Some((code, description))
            if status < 500 || messages::lookup(provider, &code).is_some() =>
        {
            GatewayError::Provider {
                provider,
                code,
                description,
            }
        }
        _ if status >= 500 || status == 429 => GatewayError::Server {
            status,
            body: body.to_string(),
        },
        _ if status == 408 => GatewayError::Network(format!("HTTP 408: {}", body)),
        _ => GatewayError::InvalidResponse(format!("HTTP {}: {}", status, body)),
    }
}

fn extract_provider_error(provider: PaymentMethod, json: &Value) -> Option<(String, String)> {
    match provider {
        PaymentMethod::Razorpay => {
            let error = json.get("error")?;
            let code = error.get("code")?.as_str()?.to_string();
            let description = error
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some((code, description))
        }
        PaymentMethod::PayPal => {
            let detail = json
                .get("details")
                .and_then(Value::as_array)
                .and_then(|details| details.first());

            let code = detail
                .and_then(|d| d.get("issue"))
                .or_else(|| json.get("name"))
                .and_then(Value::as_str)?
                .to_string();
            let description = detail
                .and_then(|d| d.get("description"))
                .or_else(|| json.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some((code, description))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_razorpay_error_body() {
        let body = r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"The amount must be at least INR 1.00"}}"#;
        let err = classify_http_failure(PaymentMethod::Razorpay, 400, body);
        match &err {
            GatewayError::Provider { code, description, .. } => {
                assert_eq!(code, "BAD_REQUEST_ERROR");
                assert_eq!(description, "The amount must be at least INR 1.00");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_paypal_issue_preferred_over_name() {
        let body = r#"{"name":"UNPROCESSABLE_ENTITY","message":"The requested action could not be performed","details":[{"issue":"INSTRUMENT_DECLINED","description":"The instrument presented was declined."}]}"#;
        let err = classify_http_failure(PaymentMethod::PayPal, 422, body);
        assert!(matches!(
            &err,
            GatewayError::Provider { code, .. } if code == "INSTRUMENT_DECLINED"
        ));
    }

    #[test]
    fn test_server_failures_are_retryable() {
        let err = classify_http_failure(PaymentMethod::PayPal, 503, "upstream unavailable");
        assert!(matches!(err, GatewayError::Server { status: 503, .. }));
        assert!(err.is_retryable());

        // Unknown provider code on a 5xx is still a server failure
        let body = r#"{"error":{"code":"MYSTERY","description":"?"}}"#;
        let err = classify_http_failure(PaymentMethod::Razorpay, 502, body);
        assert!(matches!(err, GatewayError::Server { status: 502, .. }));

        // Known code on a 5xx keeps its own classification
        let body = r#"{"error":{"code":"GATEWAY_ERROR","description":"bank timeout"}}"#;
        let err = classify_http_failure(PaymentMethod::Razorpay, 502, body);
        assert!(matches!(err, GatewayError::Provider { .. }));
        assert_eq!(err.category(), ErrorCategory::Gateway);
    }

    #[test]
    fn test_unparseable_client_error() {
        let err = classify_http_failure(PaymentMethod::Razorpay, 404, "<html>not found</html>");
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_http_api_normalizes_base_url() {
        let config = GatewayConfig {
            api_base_url: "https://donate.example.org/api".to_string(),
            ..Default::default()
        };
        let api = HttpPaymentApi::new(&config).unwrap();
        assert_eq!(api.base_url().as_str(), "https://donate.example.org/api/");
        assert_eq!(
            api.base_url().join(RAZORPAY_CREATE_ORDER).unwrap().as_str(),
            "https://donate.example.org/api/razorpay/create-order"
        );
    }

    #[test]
    fn test_http_api_rejects_bad_url() {
        let config = GatewayConfig {
            api_base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpPaymentApi::new(&config),
            Err(GatewayError::Config(_))
        ));
    }
}
