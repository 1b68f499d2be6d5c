use super::open_ledger;
use crate::error::CliResult;
use donation_ledger::RecordStatus;
use std::path::Path;

pub fn execute(ledger_path: &Path, json: bool) -> CliResult<()> {
    let ledger = open_ledger(ledger_path)?;
    let stats = ledger.stats()?;
    let months = ledger.monthly_totals()?;

    if json {
        let report = serde_json::json!({ "stats": stats, "monthly": months });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("📊 Donation statistics ({})", ledger_path.display());
    println!("   Records: {}", stats.total_records);
    for status in RecordStatus::all() {
        println!("   {:<10} {}", status.as_str(), stats.count(*status));
    }

    if stats.completed_totals.is_empty() {
        println!("\n   No completed donations yet");
        return Ok(());
    }

    println!("\n💰 Completed totals");
    for (currency, total) in &stats.completed_totals {
        let average = stats.average_donation.get(currency).copied().unwrap_or_default();
        println!(
            "   {}: {} (average {})",
            currency,
            currency.format(*total),
            currency.format(average)
        );
    }
    for (method, total) in &stats.totals_by_method {
        println!("   via {}: {}", method, total);
    }
    println!("   Recurring donations: {}", stats.recurring_count);
    println!("   Unique donors: {}", stats.unique_donors);

    println!("\n📅 By month");
    for month in &months {
        println!(
            "   {}  {:>14}  ({} donations)",
            month.label(),
            month.currency.format(month.total),
            month.count
        );
    }
    Ok(())
}
