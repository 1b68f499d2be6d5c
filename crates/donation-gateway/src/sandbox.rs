/*!
# Sandbox Backend

In-memory stand-in for the donation backend and the donor's browser. It
answers all four endpoints the way the real backend does, signs Razorpay
checkouts with its own key secret, and can be told to fail or to leave PayPal
captures pending. Used by the CLI's `--sandbox` mode and by the tests.
*/

use crate::api::{
    PaymentApi, PAYPAL_CAPTURE_ORDER, PAYPAL_CREATE_ORDER, RAZORPAY_CREATE_ORDER,
    RAZORPAY_VERIFY_PAYMENT,
};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{required_str, Approval, DonorApproval, OrderHandle};
use crate::razorpay::{razorpay_signature, verify_razorpay_signature};
use async_trait::async_trait;
use donation_forms::PaymentMethod;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

pub const SANDBOX_KEY_SECRET: &str = "sandbox_key_secret";

pub struct SandboxPaymentApi {
    key_secret: String,
    failures: Mutex<HashMap<String, VecDeque<GatewayError>>>,
    razorpay_orders: Mutex<HashSet<String>>,
    paypal_orders: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    pending_captures: AtomicUsize,
}

impl Default for SandboxPaymentApi {
    fn default() -> Self {
        Self::new(SANDBOX_KEY_SECRET)
    }
}

impl SandboxPaymentApi {
    pub fn new(key_secret: &str) -> Self {
        Self {
            key_secret: key_secret.to_string(),
            failures: Mutex::new(HashMap::new()),
            razorpay_orders: Mutex::new(HashSet::new()),
            paypal_orders: Mutex::new(HashSet::new()),
            calls: Mutex::new(HashMap::new()),
            pending_captures: AtomicUsize::new(0),
        }
    }

    pub fn key_secret(&self) -> &str {
        &self.key_secret
    }

    /// Queue an error to be returned by the next call to `path`
    pub async fn fail_next(&self, path: &str, error: GatewayError) {
        self.failures
            .lock()
            .await
            .entry(path.to_string())
            .or_default()
            .push_back(error);
    }

    /// The next `count` PayPal captures report `PENDING`
    pub fn set_pending_captures(&self, count: usize) {
        self.pending_captures.store(count, Ordering::SeqCst);
    }

    /// Number of calls made to `path`, failed ones included
    pub async fn call_count(&self, path: &str) -> usize {
        self.calls.lock().await.get(path).copied().unwrap_or(0)
    }

    async fn create_razorpay_order(&self, body: &Value) -> GatewayResult<Value> {
        let amount = body.get("amount").and_then(Value::as_u64).unwrap_or(0);
        let currency = required_str(body, "currency")?;
        if amount < 100 || currency != "INR" {
            return Err(GatewayError::Provider {
                provider: PaymentMethod::Razorpay,
                code: "BAD_REQUEST_ERROR".to_string(),
                description: format!("Cannot create an order for {} {}", amount, currency),
            });
        }

        let order_id = format!("order_{}", random_id(7));
        self.razorpay_orders.lock().await.insert(order_id.clone());
        Ok(json!({
            "id": order_id,
            "entity": "order",
            "amount": amount,
            "currency": currency,
            "status": "created",
        }))
    }

    async fn verify_razorpay_payment(&self, body: &Value) -> GatewayResult<Value> {
        let order_id = required_str(body, "razorpay_order_id")?;
        let payment_id = required_str(body, "razorpay_payment_id")?;
        let signature = required_str(body, "razorpay_signature")?;

        let known = self.razorpay_orders.lock().await.contains(order_id);
        let verified =
            known && verify_razorpay_signature(order_id, payment_id, signature, &self.key_secret);
        Ok(json!({
            "verified": verified,
            "payment_id": payment_id,
            "status": if verified { "captured" } else { "failed" },
        }))
    }

    async fn create_paypal_order(&self, body: &Value) -> GatewayResult<Value> {
        let currency = required_str(body, "currency")?;
        if currency != "USD" {
            return Err(GatewayError::Provider {
                provider: PaymentMethod::PayPal,
                code: "CURRENCY_NOT_SUPPORTED".to_string(),
                description: format!("Currency {} is not supported", currency),
            });
        }

        let order_id = random_id(8).to_uppercase();
        self.paypal_orders.lock().await.insert(order_id.clone());
        Ok(json!({ "id": order_id, "status": "CREATED" }))
    }

    async fn capture_paypal_order(&self, body: &Value) -> GatewayResult<Value> {
        let order_id = required_str(body, "orderID")?;
        if !self.paypal_orders.lock().await.contains(order_id) {
            return Err(GatewayError::Provider {
                provider: PaymentMethod::PayPal,
                code: "ORDER_NOT_APPROVED".to_string(),
                description: format!("Unknown order {}", order_id),
            });
        }

        let pending = self
            .pending_captures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let status = if pending { "PENDING" } else { "COMPLETED" };

        Ok(json!({
            "id": order_id,
            "status": status,
            "purchase_units": [{
                "payments": {
                    "captures": [{ "id": random_id(8).to_uppercase(), "status": status }]
                }
            }],
        }))
    }
}

#[async_trait]
impl PaymentApi for SandboxPaymentApi {
    async fn post_json(
        &self,
        provider: PaymentMethod,
        path: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        *self.calls.lock().await.entry(path.to_string()).or_insert(0) += 1;
        debug!(provider = provider.as_str(), path, "Sandbox request");

        let injected = self
            .failures
            .lock()
            .await
            .get_mut(path)
            .and_then(VecDeque::pop_front);
        if let Some(error) = injected {
            return Err(error);
        }

        match path {
            RAZORPAY_CREATE_ORDER => self.create_razorpay_order(&body).await,
            RAZORPAY_VERIFY_PAYMENT => self.verify_razorpay_payment(&body).await,
            PAYPAL_CREATE_ORDER => self.create_paypal_order(&body).await,
            PAYPAL_CAPTURE_ORDER => self.capture_paypal_order(&body).await,
            other => Err(GatewayError::Server {
                status: 404,
                body: format!("no sandbox route for {}", other),
            }),
        }
    }
}

/// How the simulated donor responds to the checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonorResponse {
    Approve,
    /// Closes the modal or the PayPal popup
    Cancel,
    /// Returns a Razorpay checkout result with a forged signature
    Tamper,
}

/// A donor who answers every checkout the same way
pub struct SandboxApproval {
    key_secret: String,
    response: DonorResponse,
    calls: AtomicUsize,
}

impl SandboxApproval {
    pub fn new(key_secret: &str, response: DonorResponse) -> Self {
        Self {
            key_secret: key_secret.to_string(),
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn approving(key_secret: &str) -> Self {
        Self::new(key_secret, DonorResponse::Approve)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DonorApproval for SandboxApproval {
    async fn approve(&self, order: &OrderHandle) -> GatewayResult<Approval> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.response == DonorResponse::Cancel {
            return Err(GatewayError::Cancelled);
        }

        match order.provider {
            PaymentMethod::Razorpay => {
                let payment_id = format!("pay_{}", random_id(7));
                let signature = match self.response {
                    DonorResponse::Tamper => "00".repeat(32),
                    _ => razorpay_signature(&order.order_id, &payment_id, &self.key_secret)?,
                };
                Ok(Approval::Razorpay {
                    payment_id,
                    signature,
                })
            }
            PaymentMethod::PayPal => Ok(Approval::PayPal {
                payer_id: Some("SANDBOXPAYER01".to_string()),
            }),
        }
    }
}

fn random_id(bytes: usize) -> String {
    let raw: Vec<u8> = (0..bytes).map(|_| rand::random::<u8>()).collect();
    hex::encode(raw)
}
