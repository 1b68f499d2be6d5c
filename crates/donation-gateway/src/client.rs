use crate::api::PaymentApi;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{CaptureReceipt, DonorApproval, PaymentGateway};
use crate::paypal::PayPalGateway;
use crate::razorpay::RazorpayGateway;
use crate::tracker::{PaymentState, PaymentStatusTracker};
use backoff::backoff::Backoff;
use backoff::future::retry_notify;
use donation_forms::{PaymentMethod, ValidatedDonation};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drives one donation through create → approve → capture
pub struct PaymentClient {
    gateway: Arc<dyn PaymentGateway>,
    config: GatewayConfig,
}

impl PaymentClient {
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        Ok(Self { gateway, config })
    }

    /// Build the adapter for `method` on top of a backend transport
    pub fn for_method(
        method: PaymentMethod,
        api: Arc<dyn PaymentApi>,
        approval: Arc<dyn DonorApproval>,
        config: GatewayConfig,
    ) -> GatewayResult<Self> {
        let gateway: Arc<dyn PaymentGateway> = match method {
            PaymentMethod::Razorpay => Arc::new(RazorpayGateway::new(api, approval, &config)),
            PaymentMethod::PayPal => Arc::new(PayPalGateway::new(api, approval)),
        };
        Self::new(gateway, config)
    }

    pub fn provider(&self) -> PaymentMethod {
        self.gateway.provider()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Take a payment for a validated donation
    ///
    /// Every status change is appended to `tracker`, which ends in exactly one
    /// terminal entry. The retry budget (`max_retries`) is shared by order
    /// creation and capture; the donor approval step is never retried.
    pub async fn donate(
        &self,
        donation: &ValidatedDonation,
        tracker: &mut PaymentStatusTracker,
    ) -> GatewayResult<CaptureReceipt> {
        tracker.record(PaymentState::Initiated, None, None)?;
        info!(
            provider = self.provider().as_str(),
            amount = %donation.amount,
            currency = donation.currency.code(),
            "Starting donation"
        );

        match self.run(donation, tracker).await {
            Ok(receipt) => {
                let message = format!(
                    "Payment of {} received",
                    receipt
                        .currency
                        .format(receipt.currency.from_minor_units(receipt.amount_minor))
                );
                tracker.record(
                    PaymentState::Success,
                    Some(message),
                    Some(receipt.transaction_id.clone()),
                )?;
                Ok(receipt)
            }
            Err(GatewayError::Cancelled) => {
                info!("Donor cancelled the payment");
                tracker.record(
                    PaymentState::Cancelled,
                    Some(GatewayError::Cancelled.user_message().to_string()),
                    None,
                )?;
                Err(GatewayError::Cancelled)
            }
            Err(err) => {
                warn!(category = %err.category(), "Payment failed: {}", err);
                tracker.record(
                    PaymentState::Failed,
                    Some(err.user_message().to_string()),
                    None,
                )?;
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        donation: &ValidatedDonation,
        tracker: &mut PaymentStatusTracker,
    ) -> GatewayResult<CaptureReceipt> {
        if donation.payment_method != self.provider() {
            return Err(GatewayError::InvalidDonation(format!(
                "donation is set up for {}, not {}",
                donation.payment_method,
                self.provider()
            )));
        }

        let gateway = self.gateway.clone();
        let order = self
            .with_retry("create_order", tracker, || gateway.create_order(donation))
            .await?;

        tracker.record(PaymentState::Processing, None, None)?;
        let approval = gateway.approve(&order).await?;

        self.with_retry("capture", tracker, || gateway.capture(&order, &approval))
            .await
    }

    /// Run `operation` with exponential backoff, spending from the retry budget
    /// left on `tracker`
    async fn with_retry<T, F, Fut>(
        &self,
        phase: &'static str,
        tracker: &mut PaymentStatusTracker,
        mut operation: F,
    ) -> GatewayResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let remaining = self.config.max_retries.saturating_sub(tracker.retry_count());
        let mut backoff = self.config.retry_backoff.clone();
        backoff.reset();

        let mut attempt = 0usize;
        let result = retry_notify(
            backoff,
            || {
                let this_attempt = attempt;
                attempt += 1;
                let call = operation();
                async move {
                    match call.await {
                        Ok(value) => Ok(value),
                        Err(err) if err.is_retryable() && this_attempt < remaining => {
                            Err(backoff::Error::Transient {
                                err,
                                retry_after: None,
                            })
                        }
                        Err(err) => Err(backoff::Error::Permanent(err)),
                    }
                }
            },
            |err: GatewayError, delay: Duration| {
                warn!(phase, ?delay, "Retrying after {}", err);
                if let Err(record_err) = tracker.record(
                    PaymentState::Retry,
                    Some(err.user_message().to_string()),
                    None,
                ) {
                    warn!("Could not record retry: {}", record_err);
                }
            },
        )
        .await;

        match result {
            Ok(value) => {
                debug!(phase, "Succeeded");
                Ok(value)
            }
            // Only a budget or elapsed-time stop lets a retryable error through
            Err(err) if err.is_retryable() => Err(GatewayError::RetriesExhausted {
                retries: tracker.retry_count(),
                last_error: Box::new(err),
            }),
            Err(err) => Err(err),
        }
    }
}
