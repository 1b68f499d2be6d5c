use crate::error::{GatewayError, GatewayResult};
use backoff::ExponentialBackoff;
use std::time::Duration;

/// Upper bound on `max_retries`; anything beyond this is a misconfiguration
pub const MAX_ALLOWED_RETRIES: usize = 10;

/// Configuration for payment gateway operations
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the donation backend that fronts both providers
    pub api_base_url: String,

    /// Maximum number of retries across a whole donation (order creation and capture)
    pub max_retries: usize,

    /// Backoff strategy for retry delays
    pub retry_backoff: ExponentialBackoff,

    /// Per-request timeout for backend calls
    pub request_timeout: Duration,

    /// Public Razorpay key handed to the checkout
    pub razorpay_key_id: Option<String>,

    /// When set, Razorpay signatures are also verified locally before the server round trip
    pub razorpay_key_secret: Option<String>,

    /// Organisation name shown in the provider checkout
    pub merchant_name: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api/".to_string(),
            max_retries: 3,
            retry_backoff: ExponentialBackoff {
                initial_interval: Duration::from_millis(500),
                max_interval: Duration::from_secs(8),
                max_elapsed_time: Some(Duration::from_secs(60)),
                multiplier: 2.0,
                ..Default::default()
            },
            request_timeout: Duration::from_secs(30),
            razorpay_key_id: None,
            razorpay_key_secret: None,
            merchant_name: "Donations".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Backoff with the given initial delay and the default growth settings
    pub fn with_initial_backoff(mut self, initial_interval: Duration) -> Self {
        self.retry_backoff.initial_interval = initial_interval;
        self.retry_backoff.current_interval = initial_interval;
        self
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if self.max_retries > MAX_ALLOWED_RETRIES {
            return Err(GatewayError::Config(format!(
                "max_retries {} exceeds the limit of {}",
                self.max_retries, MAX_ALLOWED_RETRIES
            )));
        }
        if self.retry_backoff.multiplier < 1.0 {
            return Err(GatewayError::Config(format!(
                "backoff multiplier {} must be at least 1.0",
                self.retry_backoff.multiplier
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(GatewayError::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
