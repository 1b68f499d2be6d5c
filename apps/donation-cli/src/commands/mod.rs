pub mod donate;
pub mod export;
pub mod history;
pub mod import;
pub mod refund;
pub mod stats;
pub mod validate;

use crate::error::{CliError, CliResult};
use clap::Args;
use donation_forms::{
    Currency, DonationStep, DonationStepController, FormConfig, FormError, Frequency,
    PaymentMethod, ValidatedDonation,
};
use donation_ledger::{DonationLedger, DonationRecord};

/// Form fields for one donation, as given on the command line
#[derive(Args, Debug, Clone)]
pub struct DonationArgs {
    /// Donation amount, e.g. 2500 or 49.99
    #[arg(short, long)]
    pub amount: String,

    /// Donor name
    #[arg(short, long)]
    pub name: String,

    /// Donor email
    #[arg(short, long)]
    pub email: String,

    /// Donor phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Payment method: razorpay or paypal
    #[arg(short, long)]
    pub method: Option<String>,

    /// Currency override: INR or USD (defaults to the configured form currency)
    #[arg(long)]
    pub currency: Option<String>,

    /// Make this a recurring donation
    #[arg(long)]
    pub recurring: bool,

    /// Recurring frequency: monthly, quarterly or yearly
    #[arg(short, long)]
    pub frequency: Option<String>,
}

impl DonationArgs {
    /// Walk the wizard through every step, printing each step's outcome
    pub fn submit(&self, mut form: FormConfig) -> CliResult<ValidatedDonation> {
        if let Some(currency) = &self.currency {
            form.currency = currency.parse::<Currency>()?;
        }
        let mut wizard = DonationStepController::new(form);

        wizard.set_custom_amount(&self.amount);
        wizard.set_recurring(self.recurring);
        if let Some(frequency) = &self.frequency {
            wizard.set_frequency(frequency.parse::<Frequency>()?);
        }
        advance(&mut wizard)?;

        wizard.set_donor_name(&self.name);
        wizard.set_donor_email(&self.email);
        if let Some(phone) = &self.phone {
            wizard.set_donor_phone(phone);
        }
        advance(&mut wizard)?;

        if let Some(method) = &self.method {
            wizard.set_payment_method(method.parse::<PaymentMethod>()?);
        }
        let donation = wizard.submit().map_err(|e| report_step(DonationStep::Payment, e))?;
        println!("✅ Step 3/3 {}", DonationStep::Payment.label());
        Ok(donation)
    }
}

fn advance(wizard: &mut DonationStepController) -> CliResult<()> {
    let step = wizard.step();
    wizard.next().map_err(|e| report_step(step, e))?;
    println!("✅ Step {}/3 {}", step.ord(), step.label());
    Ok(())
}

fn report_step(step: DonationStep, err: FormError) -> CliError {
    println!("❌ Step {}/3 {}", step.ord(), step.label());
    if let Some(errors) = err.field_errors() {
        for (field, message) in errors.iter() {
            println!("   {}: {}", field.as_str(), message);
        }
    }
    CliError::Form(err)
}

pub fn open_ledger(path: &std::path::Path) -> CliResult<DonationLedger> {
    Ok(DonationLedger::open_or_create(path)?)
}

pub fn print_record(record: &DonationRecord) {
    println!(
        "   {}  {}  {:>12}  {:<9}  {:<8}  {}{}",
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.receipt_number,
        record.display_amount(),
        record.status.as_str(),
        record.payment_method.as_str(),
        record.id,
        if record.recurring {
            record
                .frequency
                .map(|f| format!(" ({})", f.as_str()))
                .unwrap_or_default()
        } else {
            String::new()
        }
    );
}
