use super::open_ledger;
use crate::error::CliResult;
use std::path::Path;

pub fn execute(ledger_path: &Path, input: &Path) -> CliResult<()> {
    println!("📥 Importing donations from {}", input.display());
    let mut ledger = open_ledger(ledger_path)?;

    let summary = ledger.import_json(input)?;
    println!("✅ Imported {} donation(s)", summary.inserted);
    if summary.skipped > 0 {
        println!("   Skipped {} already in the ledger", summary.skipped);
    }
    Ok(())
}
