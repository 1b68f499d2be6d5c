use super::{open_ledger, print_record};
use crate::error::{CliError, CliResult};
use donation_ledger::RecordStatus;
use std::path::Path;

/// Mark a donation refunded, by record id or receipt number
pub fn execute(ledger_path: &Path, reference: &str) -> CliResult<()> {
    let mut ledger = open_ledger(ledger_path)?;

    let record = match ledger.get(reference)? {
        Some(record) => record,
        None => ledger.get_by_receipt(reference)?.ok_or_else(|| {
            CliError::InvalidArgument(format!("No donation with id or receipt '{}'", reference))
        })?,
    };

    if record.status == RecordStatus::Refunded {
        println!("ℹ️  Donation {} is already refunded", record.receipt_number);
        return Ok(());
    }

    let updated = ledger.update_status(&record.id, RecordStatus::Refunded)?;
    println!("↩️  Refunded {}", updated.receipt_number);
    print_record(&updated);
    Ok(())
}
