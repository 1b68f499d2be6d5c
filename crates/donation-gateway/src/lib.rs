/*!
# Donation Gateway

Takes payment for a validated donation through Razorpay (INR) or PayPal (USD).
Provider error codes are mapped to donor-facing messages, transient failures are
retried with exponential backoff, and every status change lands in a
`PaymentStatusTracker`.

## Quick Start

```rust,no_run
use donation_forms::ValidatedDonation;
use donation_gateway::{
    GatewayConfig, HttpPaymentApi, PaymentClient, PaymentStatusTracker, SandboxApproval,
};
use std::sync::Arc;

# async fn example(donation: ValidatedDonation) -> Result<(), Box<dyn std::error::Error>> {
let config = GatewayConfig {
    api_base_url: "https://donate.example.org/api/".to_string(),
    ..Default::default()
};
let api = Arc::new(HttpPaymentApi::new(&config)?);
let approval = Arc::new(SandboxApproval::approving("rzp_secret"));
let client = PaymentClient::for_method(donation.payment_method, api, approval, config)?;

let mut tracker = PaymentStatusTracker::new();
match client.donate(&donation, &mut tracker).await {
    Ok(receipt) => println!("Thank you! Transaction {}", receipt.transaction_id),
    Err(err) => println!("{}", err.user_message()),
}
# Ok(())
# }
```

## Retries

Only network, gateway and server failures (including a PayPal capture left
`PENDING`) are retried. Cancellation, validation and account problems fail
immediately. `max_retries` is one budget for the whole donation; when it runs
out the payment fails with `GatewayError::RetriesExhausted`.
*/

mod api;
mod client;
mod config;
mod error;
mod gateway;
pub mod messages;
mod paypal;
mod razorpay;
pub mod sandbox;
mod tracker;

pub use api::{
    classify_http_failure, HttpPaymentApi, PaymentApi, PAYPAL_CAPTURE_ORDER, PAYPAL_CREATE_ORDER,
    RAZORPAY_CREATE_ORDER, RAZORPAY_VERIFY_PAYMENT,
};
pub use client::PaymentClient;
pub use config::{GatewayConfig, MAX_ALLOWED_RETRIES};
pub use error::{ErrorCategory, GatewayError, GatewayResult};
pub use gateway::{Approval, CaptureReceipt, DonorApproval, OrderHandle, PaymentGateway};
pub use paypal::PayPalGateway;
pub use razorpay::{razorpay_signature, verify_razorpay_signature, RazorpayGateway};
pub use sandbox::{DonorResponse, SandboxApproval, SandboxPaymentApi, SANDBOX_KEY_SECRET};
pub use tracker::{PaymentState, PaymentStatus, PaymentStatusTracker};
