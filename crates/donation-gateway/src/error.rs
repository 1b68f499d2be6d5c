use crate::messages;
use crate::tracker::PaymentState;
use donation_forms::PaymentMethod;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Coarse classification that drives retry decisions and donor-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Bad input; the donor can fix it and try again
    Validation,
    Network,
    Gateway,
    Server,
    /// Account or permission problem; only support can help
    Account,
    Cancelled,
    Unknown,
}

impl ErrorCategory {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::Network | ErrorCategory::Gateway | ErrorCategory::Server
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Network => "network",
            ErrorCategory::Gateway => "gateway",
            ErrorCategory::Server => "server",
            ErrorCategory::Account => "account",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while taking a payment
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("{provider} error {code}: {description}")]
    Provider {
        provider: PaymentMethod,
        code: String,
        description: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    #[error("Payment cancelled by donor")]
    Cancelled,

    #[error("Payment signature verification failed for order {order_id}")]
    SignatureMismatch { order_id: String },

    #[error("Capture pending for order {order_id}")]
    CapturePending { order_id: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Payment failed after {retries} retries: {last_error}")]
    RetriesExhausted {
        retries: usize,
        last_error: Box<GatewayError>,
    },

    #[error("Invalid donation: {0}")]
    InvalidDonation(String),

    #[error("Payment already {current}; cannot record {attempted}")]
    TrackerClosed {
        current: PaymentState,
        attempted: PaymentState,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::Provider { provider, code, .. } => messages::lookup(*provider, code)
                .map(|entry| entry.category)
                .unwrap_or(ErrorCategory::Unknown),
            GatewayError::Network(_) => ErrorCategory::Network,
            GatewayError::Server { .. } => ErrorCategory::Server,
            GatewayError::Cancelled => ErrorCategory::Cancelled,
            GatewayError::SignatureMismatch { .. } => ErrorCategory::Validation,
            GatewayError::CapturePending { .. } => ErrorCategory::Gateway,
            GatewayError::InvalidResponse(_) => ErrorCategory::Unknown,
            GatewayError::RetriesExhausted { last_error, .. } => last_error.category(),
            GatewayError::InvalidDonation(_) => ErrorCategory::Validation,
            GatewayError::TrackerClosed { .. } | GatewayError::Config(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether another attempt might succeed; exhausted retries never are
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::RetriesExhausted { .. } => false,
            other => other.category().is_retryable(),
        }
    }

    /// Message safe to show to the donor
    pub fn user_message(&self) -> &'static str {
        match self {
            GatewayError::Provider { provider, code, .. } => messages::user_message(*provider, code),
            GatewayError::Network(_) => messages::NETWORK_MESSAGE,
            GatewayError::Server { .. } => messages::SERVER_MESSAGE,
            GatewayError::Cancelled => messages::CANCELLED_MESSAGE,
            GatewayError::SignatureMismatch { .. } => messages::VERIFICATION_MESSAGE,
            GatewayError::CapturePending { .. } => {
                messages::user_message(PaymentMethod::PayPal, messages::PAYPAL_CAPTURE_PENDING)
            }
            GatewayError::RetriesExhausted { .. } => messages::RETRIES_EXHAUSTED_MESSAGE,
            GatewayError::InvalidDonation(_) => messages::INVALID_DONATION_MESSAGE,
            GatewayError::InvalidResponse(_)
            | GatewayError::TrackerClosed { .. }
            | GatewayError::Config(_) => messages::GENERIC_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_categories() {
        assert!(GatewayError::Network("timeout".into()).is_retryable());
        assert!(GatewayError::Server {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(GatewayError::CapturePending {
            order_id: "5O190127TN364715T".into()
        }
        .is_retryable());

        assert!(!GatewayError::Cancelled.is_retryable());
        assert!(!GatewayError::InvalidResponse("garbage".into()).is_retryable());
        assert!(!GatewayError::SignatureMismatch {
            order_id: "order_1".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_provider_codes_classified() {
        let restricted = GatewayError::Provider {
            provider: PaymentMethod::PayPal,
            code: "PAYER_ACCOUNT_RESTRICTED".into(),
            description: "restricted".into(),
        };
        assert_eq!(restricted.category(), ErrorCategory::Account);
        assert!(!restricted.is_retryable());
        assert!(restricted.user_message().contains("contact"));

        let gateway = GatewayError::Provider {
            provider: PaymentMethod::Razorpay,
            code: "GATEWAY_ERROR".into(),
            description: "bank down".into(),
        };
        assert_eq!(gateway.category(), ErrorCategory::Gateway);
        assert!(gateway.is_retryable());

        let unknown = GatewayError::Provider {
            provider: PaymentMethod::Razorpay,
            code: "SOMETHING_NEW".into(),
            description: "?".into(),
        };
        assert_eq!(unknown.category(), ErrorCategory::Unknown);
        assert_eq!(unknown.user_message(), messages::GENERIC_MESSAGE);
    }

    #[test]
    fn test_exhausted_is_terminal() {
        let err = GatewayError::RetriesExhausted {
            retries: 3,
            last_error: Box::new(GatewayError::Network("reset".into())),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Payment failed after 3 retries: Network error: reset"
        );
    }
}
