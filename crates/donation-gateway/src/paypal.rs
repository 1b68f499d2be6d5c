/*!
# PayPal Adapter

The backend creates the order, the donor approves it with the PayPal buttons,
and capture is one more backend round trip. PayPal can accept the capture but
leave it `PENDING`; that comes back as `CapturePending` so the client retries it.
*/

use crate::api::{PaymentApi, PAYPAL_CAPTURE_ORDER, PAYPAL_CREATE_ORDER};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{
    amount_minor, donation_description, ensure_supported, required_str, Approval, CaptureReceipt,
    DonorApproval, OrderHandle, PaymentGateway,
};
use async_trait::async_trait;
use chrono::Utc;
use donation_forms::{PaymentMethod, ValidatedDonation};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub struct PayPalGateway {
    api: Arc<dyn PaymentApi>,
    approval: Arc<dyn DonorApproval>,
}

impl PayPalGateway {
    pub fn new(api: Arc<dyn PaymentApi>, approval: Arc<dyn DonorApproval>) -> Self {
        Self { api, approval }
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    fn provider(&self) -> PaymentMethod {
        PaymentMethod::PayPal
    }

    async fn create_order(&self, donation: &ValidatedDonation) -> GatewayResult<OrderHandle> {
        ensure_supported(self.provider(), donation)?;
        let amount_minor = amount_minor(donation)?;

        // PayPal takes a decimal string in major units
        let body = json!({
            "amount": format!("{:.2}", donation.amount),
            "currency": donation.currency.code(),
            "description": donation_description(donation),
        });
        let response = self
            .api
            .post_json(PaymentMethod::PayPal, PAYPAL_CREATE_ORDER, body)
            .await?;

        let order_id = required_str(&response, "id")?.to_string();
        info!(order_id = %order_id, amount_minor, "PayPal order created");

        Ok(OrderHandle {
            provider: PaymentMethod::PayPal,
            order_id,
            amount_minor,
            currency: donation.currency,
        })
    }

    async fn approve(&self, order: &OrderHandle) -> GatewayResult<Approval> {
        debug!(order_id = %order.order_id, "Waiting for PayPal approval");
        match self.approval.approve(order).await? {
            approval @ Approval::PayPal { .. } => Ok(approval),
            other => Err(GatewayError::InvalidResponse(format!(
                "expected a PayPal approval, got {:?}",
                other
            ))),
        }
    }

    async fn capture(
        &self,
        order: &OrderHandle,
        approval: &Approval,
    ) -> GatewayResult<CaptureReceipt> {
        if !matches!(approval, Approval::PayPal { .. }) {
            return Err(GatewayError::InvalidResponse(format!(
                "expected a PayPal approval, got {:?}",
                approval
            )));
        }

        let response = self
            .api
            .post_json(
                PaymentMethod::PayPal,
                PAYPAL_CAPTURE_ORDER,
                json!({ "orderID": order.order_id }),
            )
            .await?;

        let capture = response
            .pointer("/purchase_units/0/payments/captures/0")
            .ok_or_else(|| {
                GatewayError::InvalidResponse(format!("no capture in {}", response))
            })?;
        let capture_status = capture
            .get("status")
            .and_then(Value::as_str)
            .or_else(|| response.get("status").and_then(Value::as_str))
            .unwrap_or_default();

        match capture_status {
            "COMPLETED" => {
                let transaction_id = required_str(capture, "id")?.to_string();
                info!(order_id = %order.order_id, transaction_id = %transaction_id, "PayPal capture completed");
                Ok(CaptureReceipt {
                    provider: PaymentMethod::PayPal,
                    order_id: order.order_id.clone(),
                    transaction_id,
                    provider_status: capture_status.to_string(),
                    amount_minor: order.amount_minor,
                    currency: order.currency,
                    captured_at: Utc::now(),
                })
            }
            "PENDING" => Err(GatewayError::CapturePending {
                order_id: order.order_id.clone(),
            }),
            "DECLINED" | "FAILED" => Err(GatewayError::Provider {
                provider: PaymentMethod::PayPal,
                code: "INSTRUMENT_DECLINED".to_string(),
                description: format!("capture {}", capture_status.to_lowercase()),
            }),
            other => Err(GatewayError::InvalidResponse(format!(
                "unexpected capture status '{}'",
                other
            ))),
        }
    }
}
