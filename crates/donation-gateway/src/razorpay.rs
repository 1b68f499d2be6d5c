/*!
# Razorpay Adapter

Order creation goes through the backend (amounts in paise). The donor pays in
the Razorpay checkout modal, which returns a payment id and an HMAC-SHA256
signature over `"{order_id}|{payment_id}"`. Capture means verifying that
signature: locally when the key secret is configured, and always via the
backend's verification callback.
*/

use crate::api::{PaymentApi, RAZORPAY_CREATE_ORDER, RAZORPAY_VERIFY_PAYMENT};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{
    amount_minor, donation_description, donation_notes, ensure_supported, required_str, Approval,
    CaptureReceipt, DonorApproval, OrderHandle, PaymentGateway,
};
use async_trait::async_trait;
use chrono::Utc;
use donation_forms::{PaymentMethod, ValidatedDonation};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

pub struct RazorpayGateway {
    api: Arc<dyn PaymentApi>,
    approval: Arc<dyn DonorApproval>,
    key_id: Option<String>,
    key_secret: Option<String>,
    merchant_name: String,
}

impl RazorpayGateway {
    pub fn new(
        api: Arc<dyn PaymentApi>,
        approval: Arc<dyn DonorApproval>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            api,
            approval,
            key_id: config.razorpay_key_id.clone(),
            key_secret: config.razorpay_key_secret.clone(),
            merchant_name: config.merchant_name.clone(),
        }
    }

    /// Options object for `new Razorpay(options)` in the browser checkout
    pub fn checkout_options(&self, order: &OrderHandle, donation: &ValidatedDonation) -> Value {
        json!({
            "key": self.key_id,
            "amount": order.amount_minor,
            "currency": order.currency.code(),
            "name": self.merchant_name,
            "description": donation_description(donation),
            "order_id": order.order_id,
            "prefill": {
                "name": donation.donor.name,
                "email": donation.donor.email,
                "contact": donation.donor.phone,
            },
            "notes": donation_notes(donation),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn provider(&self) -> PaymentMethod {
        PaymentMethod::Razorpay
    }

    async fn create_order(&self, donation: &ValidatedDonation) -> GatewayResult<OrderHandle> {
        ensure_supported(self.provider(), donation)?;
        let amount_minor = amount_minor(donation)?;

        let body = json!({
            "amount": amount_minor,
            "currency": donation.currency.code(),
            "notes": donation_notes(donation),
        });
        let response = self
            .api
            .post_json(PaymentMethod::Razorpay, RAZORPAY_CREATE_ORDER, body)
            .await?;

        let order_id = required_str(&response, "id")?.to_string();
        if let Some(amount) = response.get("amount").and_then(Value::as_u64) {
            if amount != amount_minor {
                return Err(GatewayError::InvalidResponse(format!(
                    "order {} created for {} paise, expected {}",
                    order_id, amount, amount_minor
                )));
            }
        }

        info!(order_id = %order_id, amount_minor, "Razorpay order created");
        Ok(OrderHandle {
            provider: PaymentMethod::Razorpay,
            order_id,
            amount_minor,
            currency: donation.currency,
        })
    }

    async fn approve(&self, order: &OrderHandle) -> GatewayResult<Approval> {
        debug!(order_id = %order.order_id, "Opening Razorpay checkout");
        match self.approval.approve(order).await? {
            approval @ Approval::Razorpay { .. } => Ok(approval),
            other => Err(GatewayError::InvalidResponse(format!(
                "expected a Razorpay checkout result, got {:?}",
                other
            ))),
        }
    }

    async fn capture(
        &self,
        order: &OrderHandle,
        approval: &Approval,
    ) -> GatewayResult<CaptureReceipt> {
        let (payment_id, signature) = match approval {
            Approval::Razorpay {
                payment_id,
                signature,
            } => (payment_id, signature),
            other => {
                return Err(GatewayError::InvalidResponse(format!(
                    "expected a Razorpay checkout result, got {:?}",
                    other
                )))
            }
        };

        if let Some(secret) = &self.key_secret {
            if !verify_razorpay_signature(&order.order_id, payment_id, signature, secret) {
                warn!(order_id = %order.order_id, "Local Razorpay signature check failed");
                return Err(GatewayError::SignatureMismatch {
                    order_id: order.order_id.clone(),
                });
            }
        }

        let body = json!({
            "razorpay_order_id": order.order_id,
            "razorpay_payment_id": payment_id,
            "razorpay_signature": signature,
        });
        let response = self
            .api
            .post_json(PaymentMethod::Razorpay, RAZORPAY_VERIFY_PAYMENT, body)
            .await?;

        let verified = response
            .get("verified")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !verified {
            return Err(GatewayError::SignatureMismatch {
                order_id: order.order_id.clone(),
            });
        }

        let transaction_id = response
            .get("payment_id")
            .and_then(Value::as_str)
            .unwrap_or(payment_id)
            .to_string();
        let provider_status = response
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("captured")
            .to_string();

        info!(order_id = %order.order_id, transaction_id = %transaction_id, "Razorpay payment verified");
        Ok(CaptureReceipt {
            provider: PaymentMethod::Razorpay,
            order_id: order.order_id.clone(),
            transaction_id,
            provider_status,
            amount_minor: order.amount_minor,
            currency: order.currency,
            captured_at: Utc::now(),
        })
    }
}

/// Hex HMAC-SHA256 of `"{order_id}|{payment_id}"`, as Razorpay computes it
pub fn razorpay_signature(order_id: &str, payment_id: &str, secret: &str) -> GatewayResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatewayError::Config(format!("Invalid Razorpay key secret: {}", e)))?;
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a checkout signature
pub fn verify_razorpay_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_round_trip() {
        let signature = razorpay_signature("order_IluGWxBm9U8zJ8", "pay_IluGWxBm9U8zJ9", "s3cret").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_razorpay_signature(
            "order_IluGWxBm9U8zJ8",
            "pay_IluGWxBm9U8zJ9",
            &signature,
            "s3cret"
        ));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let signature = razorpay_signature("order_A", "pay_B", "s3cret").unwrap();
        assert!(!verify_razorpay_signature("order_A", "pay_C", &signature, "s3cret"));
        assert!(!verify_razorpay_signature("order_A", "pay_B", &signature, "other"));
        assert!(!verify_razorpay_signature("order_A", "pay_B", "not-hex", "s3cret"));
    }
}
