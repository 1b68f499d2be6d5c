use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use donation_forms::{Currency, Frequency, PaymentMethod, ValidatedDonation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// An order created with a provider, waiting for the donor to approve it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHandle {
    pub provider: PaymentMethod,
    pub order_id: String,
    /// Amount in minor units (paise, cents)
    pub amount_minor: u64,
    pub currency: Currency,
}

/// What the donor-interaction step hands back to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum Approval {
    /// Result of the Razorpay checkout modal
    Razorpay {
        payment_id: String,
        signature: String,
    },
    /// Result of the PayPal buttons `onApprove` callback
    #[serde(rename = "paypal")]
    PayPal { payer_id: Option<String> },
}

/// Normalized outcome of a successful capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureReceipt {
    pub provider: PaymentMethod,
    pub order_id: String,
    pub transaction_id: String,
    /// Status string as reported by the provider (`captured`, `COMPLETED`)
    pub provider_status: String,
    pub amount_minor: u64,
    pub currency: Currency,
    pub captured_at: DateTime<Utc>,
}

/// The donor-interaction step: the Razorpay modal or the PayPal buttons
///
/// Returning `GatewayError::Cancelled` is how a donor closing the checkout is
/// reported; there is no other cancellation channel.
#[async_trait]
pub trait DonorApproval: Send + Sync {
    async fn approve(&self, order: &OrderHandle) -> GatewayResult<Approval>;
}

/// Common contract of both payment providers
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentMethod;

    /// Create a provider order for the donation
    async fn create_order(&self, donation: &ValidatedDonation) -> GatewayResult<OrderHandle>;

    /// Hand the order to the donor for approval; never retried
    async fn approve(&self, order: &OrderHandle) -> GatewayResult<Approval>;

    /// Capture (or verify) the approved payment
    async fn capture(&self, order: &OrderHandle, approval: &Approval)
        -> GatewayResult<CaptureReceipt>;
}

// ================================================================================================
// Shared adapter helpers
// ================================================================================================

/// Reject donations routed to the wrong provider or in a currency it cannot charge
pub(crate) fn ensure_supported(
    provider: PaymentMethod,
    donation: &ValidatedDonation,
) -> GatewayResult<()> {
    if donation.payment_method != provider {
        return Err(GatewayError::InvalidDonation(format!(
            "donation is set up for {}, not {}",
            donation.payment_method, provider
        )));
    }
    if !provider.supports(donation.currency) {
        return Err(GatewayError::InvalidDonation(format!(
            "{} does not accept {} donations",
            provider, donation.currency
        )));
    }
    Ok(())
}

pub(crate) fn amount_minor(donation: &ValidatedDonation) -> GatewayResult<u64> {
    donation
        .amount_minor()
        .map_err(|e| GatewayError::InvalidDonation(e.to_string()))
}

pub(crate) fn required_str<'a>(json: &'a Value, field: &str) -> GatewayResult<&'a str> {
    json.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| GatewayError::InvalidResponse(format!("missing '{}' in {}", field, json)))
}

/// Donor details attached to provider orders for reconciliation
pub(crate) fn donation_notes(donation: &ValidatedDonation) -> Value {
    json!({
        "donor_name": donation.donor.name,
        "donor_email": donation.donor.email,
        "recurring": donation.recurring,
        "frequency": donation.frequency.map(|f| f.as_str()),
    })
}

/// Human-readable order description, e.g. "Monthly donation"
pub(crate) fn donation_description(donation: &ValidatedDonation) -> &'static str {
    match donation.frequency {
        Some(Frequency::Monthly) if donation.recurring => "Monthly donation",
        Some(Frequency::Quarterly) if donation.recurring => "Quarterly donation",
        Some(Frequency::Yearly) if donation.recurring => "Yearly donation",
        _ => "One-time donation",
    }
}
