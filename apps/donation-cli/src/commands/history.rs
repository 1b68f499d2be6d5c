use super::{open_ledger, print_record};
use crate::error::CliResult;
use std::path::Path;

pub fn execute(ledger_path: &Path, email: &str) -> CliResult<()> {
    let ledger = open_ledger(ledger_path)?;
    let history = ledger.donor_history(email)?;

    if history.is_empty() {
        println!("❌ No donations found for {}", email);
        return Ok(());
    }

    println!("🧾 {} donation(s) for {}", history.len(), email);
    for record in &history {
        print_record(record);
    }
    Ok(())
}
