use super::{open_ledger, DonationArgs};
use crate::config::DonationConfig;
use crate::console::ConsoleApproval;
use crate::error::{CliError, CliResult};
use clap::ValueEnum;
use donation_forms::ValidatedDonation;
use donation_gateway::{
    DonorApproval, DonorResponse, GatewayError, HttpPaymentApi, PaymentApi, PaymentClient,
    PaymentStatusTracker, SandboxApproval, SandboxPaymentApi, SANDBOX_KEY_SECRET,
};
use donation_ledger::{DonationLedger, DonationRecord};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// How the simulated donor behaves in sandbox mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SandboxDonor {
    Approve,
    Cancel,
    Tamper,
}

impl From<SandboxDonor> for DonorResponse {
    fn from(donor: SandboxDonor) -> Self {
        match donor {
            SandboxDonor::Approve => DonorResponse::Approve,
            SandboxDonor::Cancel => DonorResponse::Cancel,
            SandboxDonor::Tamper => DonorResponse::Tamper,
        }
    }
}

/// What happened to a donation attempt
#[derive(Debug)]
pub enum DonationOutcome {
    Completed(DonationRecord),
    Cancelled,
    Failed(DonationRecord, GatewayError),
}

pub async fn execute(
    config: &DonationConfig,
    ledger_path: &Path,
    args: &DonationArgs,
    sandbox: Option<SandboxDonor>,
) -> CliResult<()> {
    println!("📝 Validating donation...");
    let donation = args.submit(config.form.clone())?;

    let mut gateway_config = config.gateway.to_gateway_config()?;
    let (api, approval): (Arc<dyn PaymentApi>, Arc<dyn DonorApproval>) = match sandbox {
        Some(donor) => {
            println!("🧪 Sandbox mode: no real payment will be taken");
            gateway_config.razorpay_key_secret = Some(SANDBOX_KEY_SECRET.to_string());
            let api: Arc<dyn PaymentApi> = Arc::new(SandboxPaymentApi::new(SANDBOX_KEY_SECRET));
            let approval: Arc<dyn DonorApproval> =
                Arc::new(SandboxApproval::new(SANDBOX_KEY_SECRET, donor.into()));
            (api, approval)
        }
        None => {
            let api: Arc<dyn PaymentApi> = Arc::new(HttpPaymentApi::new(&gateway_config)?);
            let approval: Arc<dyn DonorApproval> = Arc::new(ConsoleApproval);
            (api, approval)
        }
    };
    let client = PaymentClient::for_method(donation.payment_method, api, approval, gateway_config)?;

    let mut ledger = open_ledger(ledger_path)?;
    println!(
        "\n💸 Donating {} via {}...",
        donation.currency.format(donation.amount),
        donation.payment_method
    );

    match run_donation(&client, &donation, &mut ledger).await? {
        DonationOutcome::Completed(record) => {
            println!("\n🎉 Thank you, {}!", record.donor_name);
            println!("   Receipt: {}", record.receipt_number);
            if let Some(transaction_id) = &record.transaction_id {
                println!("   Transaction: {}", transaction_id);
            }
            Ok(())
        }
        DonationOutcome::Cancelled => {
            println!("\n🚫 {}", GatewayError::Cancelled.user_message());
            Ok(())
        }
        DonationOutcome::Failed(record, err) => {
            println!("\n❌ {}", err.user_message());
            println!("   Reference: {}", record.receipt_number);
            Err(CliError::Gateway(err))
        }
    }
}

/// Take the payment and record the outcome in the ledger
///
/// Cancelled attempts are not recorded.
pub async fn run_donation(
    client: &PaymentClient,
    donation: &ValidatedDonation,
    ledger: &mut DonationLedger,
) -> CliResult<DonationOutcome> {
    let mut tracker = PaymentStatusTracker::new();
    let result = client.donate(donation, &mut tracker).await;

    for entry in tracker.entries() {
        println!(
            "   [{}] {}{}",
            entry.recorded_at.format("%H:%M:%S"),
            entry.state,
            entry
                .message
                .as_deref()
                .map(|m| format!(": {}", m))
                .unwrap_or_default()
        );
    }

    let outcome = match result {
        Ok(receipt) => {
            let record = DonationRecord::completed(donation, &receipt.transaction_id);
            ledger.insert(&record)?;
            DonationOutcome::Completed(record)
        }
        Err(GatewayError::Cancelled) => DonationOutcome::Cancelled,
        Err(err) => {
            let record = DonationRecord::failed(donation);
            ledger.insert(&record)?;
            DonationOutcome::Failed(record, err)
        }
    };

    info!(retries = tracker.retry_count(), state = %tracker.state(), "Donation finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use donation_forms::{Currency, DonorInfo, PaymentMethod};
    use donation_gateway::GatewayConfig;
    use donation_ledger::RecordStatus;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn donation() -> ValidatedDonation {
        ValidatedDonation {
            amount: Decimal::from(1500),
            currency: Currency::Inr,
            donor: DonorInfo {
                name: "Farah Khan".to_string(),
                email: "farah@example.in".to_string(),
                phone: None,
            },
            recurring: false,
            frequency: None,
            payment_method: PaymentMethod::Razorpay,
        }
    }

    fn sandbox_client(response: DonorResponse) -> PaymentClient {
        let config = GatewayConfig {
            razorpay_key_secret: Some(SANDBOX_KEY_SECRET.to_string()),
            ..Default::default()
        }
        .with_initial_backoff(Duration::from_millis(1));
        PaymentClient::for_method(
            PaymentMethod::Razorpay,
            Arc::new(SandboxPaymentApi::default()),
            Arc::new(SandboxApproval::new(SANDBOX_KEY_SECRET, response)),
            config,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_completed_donation_is_recorded() {
        let mut ledger = DonationLedger::create_in_memory().unwrap();
        let outcome = run_donation(&sandbox_client(DonorResponse::Approve), &donation(), &mut ledger)
            .await
            .unwrap();

        let record = match outcome {
            DonationOutcome::Completed(record) => record,
            other => panic!("unexpected {:?}", other),
        };
        assert!(record.transaction_id.as_deref().unwrap().starts_with("pay_"));
        let stored = ledger.get(&record.id).unwrap().unwrap();
        assert_eq!(stored.status, RecordStatus::Completed);
    }

    #[tokio::test]
    async fn test_cancelled_donation_is_not_recorded() {
        let mut ledger = DonationLedger::create_in_memory().unwrap();
        let outcome = run_donation(&sandbox_client(DonorResponse::Cancel), &donation(), &mut ledger)
            .await
            .unwrap();

        assert!(matches!(outcome, DonationOutcome::Cancelled));
        assert_eq!(ledger.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_donation_is_recorded() {
        let mut ledger = DonationLedger::create_in_memory().unwrap();
        let outcome = run_donation(&sandbox_client(DonorResponse::Tamper), &donation(), &mut ledger)
            .await
            .unwrap();

        match outcome {
            DonationOutcome::Failed(record, err) => {
                assert!(matches!(err, GatewayError::SignatureMismatch { .. }));
                assert_eq!(record.status, RecordStatus::Failed);
                assert!(record.transaction_id.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ledger.stats().unwrap().count(RecordStatus::Failed), 1);
    }
}
