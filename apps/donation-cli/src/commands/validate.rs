use super::DonationArgs;
use crate::config::DonationConfig;
use crate::error::CliResult;

pub fn execute(config: &DonationConfig, args: &DonationArgs) -> CliResult<()> {
    println!("📝 Validating donation form...");

    let donation = args.submit(config.form.clone())?;

    println!("\n✅ Donation is valid");
    println!("   Amount: {}", donation.currency.format(donation.amount));
    println!("   Donor: {} <{}>", donation.donor.name, donation.donor.email);
    if let Some(frequency) = donation.frequency {
        println!("   Recurring: {}", frequency);
    }
    println!("   Method: {}", donation.payment_method);
    Ok(())
}
