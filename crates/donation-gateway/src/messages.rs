/*!
# Donor-Facing Error Messages

Lookup tables from provider error codes to a category and a fixed message.
Anything not listed falls back to [`GENERIC_MESSAGE`].
*/

use crate::error::ErrorCategory;
use donation_forms::PaymentMethod;

pub const GENERIC_MESSAGE: &str =
    "Something went wrong while processing your donation. Please try again or contact support.";
pub const NETWORK_MESSAGE: &str =
    "We could not reach the payment service. Please check your connection and try again.";
pub const SERVER_MESSAGE: &str =
    "The payment service is temporarily unavailable. Please try again in a few minutes.";
pub const CANCELLED_MESSAGE: &str = "Payment was cancelled. You have not been charged.";
pub const VERIFICATION_MESSAGE: &str =
    "We could not verify your payment. If you were charged, please contact support with your payment reference.";
pub const RETRIES_EXHAUSTED_MESSAGE: &str =
    "We could not complete your donation after several attempts. Please try again later.";
pub const INVALID_DONATION_MESSAGE: &str =
    "Some donation details are invalid. Please review the form and try again.";

pub const PAYPAL_CAPTURE_PENDING: &str = "CAPTURE_PENDING";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEntry {
    pub code: &'static str,
    pub category: ErrorCategory,
    pub message: &'static str,
}

const fn entry(code: &'static str, category: ErrorCategory, message: &'static str) -> ErrorEntry {
    ErrorEntry {
        code,
        category,
        message,
    }
}

// ================================================================================================
// Razorpay
// ================================================================================================

const RAZORPAY_ERRORS: &[ErrorEntry] = &[
    entry(
        "BAD_REQUEST_ERROR",
        ErrorCategory::Validation,
        "Payment failed due to invalid details. Please check your payment information and try again.",
    ),
    entry(
        "GATEWAY_ERROR",
        ErrorCategory::Gateway,
        "The payment gateway had a problem. Please try again in a few moments.",
    ),
    entry("SERVER_ERROR", ErrorCategory::Server, SERVER_MESSAGE),
    entry("NETWORK_ERROR", ErrorCategory::Network, NETWORK_MESSAGE),
    entry(
        "PAYMENT_CANCELLED",
        ErrorCategory::Cancelled,
        CANCELLED_MESSAGE,
    ),
    entry(
        "ACCOUNT_SUSPENDED",
        ErrorCategory::Account,
        "Payments to this account are currently unavailable. Please contact support.",
    ),
];

// ================================================================================================
// PayPal
// ================================================================================================

const PAYPAL_ERRORS: &[ErrorEntry] = &[
    entry(
        "INSTRUMENT_DECLINED",
        ErrorCategory::Validation,
        "Your payment method was declined. Please try a different card or funding source.",
    ),
    entry(
        "PAYER_ACTION_REQUIRED",
        ErrorCategory::Validation,
        "PayPal needs you to complete an extra step. Please try again and follow the prompts.",
    ),
    entry(
        "ORDER_NOT_APPROVED",
        ErrorCategory::Validation,
        "The payment was not approved in PayPal. Please try again.",
    ),
    entry(
        "ORDER_ALREADY_CAPTURED",
        ErrorCategory::Validation,
        "This donation has already been processed.",
    ),
    entry(
        "DUPLICATE_INVOICE_ID",
        ErrorCategory::Validation,
        "This donation has already been submitted.",
    ),
    entry(
        "PAYER_ACCOUNT_RESTRICTED",
        ErrorCategory::Account,
        "Your PayPal account is restricted. Please contact PayPal or our support team.",
    ),
    entry(
        "PAYER_ACCOUNT_LOCKED_OR_CLOSED",
        ErrorCategory::Account,
        "Your PayPal account is locked or closed. Please contact PayPal or our support team.",
    ),
    entry(
        "PAYEE_ACCOUNT_RESTRICTED",
        ErrorCategory::Account,
        "We cannot accept PayPal donations right now. Please contact support.",
    ),
    entry(
        "TRANSACTION_REFUSED",
        ErrorCategory::Account,
        "PayPal refused this transaction. Please contact support.",
    ),
    entry(
        PAYPAL_CAPTURE_PENDING,
        ErrorCategory::Gateway,
        "Your payment is still being processed by PayPal. Please wait a moment.",
    ),
    entry("INTERNAL_SERVER_ERROR", ErrorCategory::Server, SERVER_MESSAGE),
    entry("SERVICE_UNAVAILABLE", ErrorCategory::Server, SERVER_MESSAGE),
];

fn table(provider: PaymentMethod) -> &'static [ErrorEntry] {
    match provider {
        PaymentMethod::Razorpay => RAZORPAY_ERRORS,
        PaymentMethod::PayPal => PAYPAL_ERRORS,
    }
}

/// Find the table entry for a provider error code (case-insensitive)
pub fn lookup(provider: PaymentMethod, code: &str) -> Option<&'static ErrorEntry> {
    table(provider)
        .iter()
        .find(|entry| entry.code.eq_ignore_ascii_case(code.trim()))
}

pub fn user_message(provider: PaymentMethod, code: &str) -> &'static str {
    lookup(provider, code)
        .map(|entry| entry.message)
        .unwrap_or(GENERIC_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let entry = lookup(PaymentMethod::PayPal, "instrument_declined").unwrap();
        assert_eq!(entry.category, ErrorCategory::Validation);
    }

    #[test]
    fn test_unmapped_code_falls_back() {
        assert_eq!(user_message(PaymentMethod::Razorpay, "NOPE"), GENERIC_MESSAGE);
        assert_eq!(user_message(PaymentMethod::PayPal, ""), GENERIC_MESSAGE);
    }

    #[test]
    fn test_codes_are_provider_scoped() {
        assert!(lookup(PaymentMethod::Razorpay, "GATEWAY_ERROR").is_some());
        assert!(lookup(PaymentMethod::PayPal, "GATEWAY_ERROR").is_none());
    }

    #[test]
    fn test_tables_have_unique_codes() {
        for provider in [PaymentMethod::Razorpay, PaymentMethod::PayPal] {
            let codes = table(provider);
            for (i, a) in codes.iter().enumerate() {
                assert!(
                    codes[i + 1..].iter().all(|b| b.code != a.code),
                    "duplicate code {} for {}",
                    a.code,
                    provider
                );
            }
        }
    }
}
