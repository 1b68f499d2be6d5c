use super::open_ledger;
use crate::error::CliResult;
use clap::ValueEnum;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

pub fn execute(ledger_path: &Path, output: &Path, format: ExportFormat) -> CliResult<()> {
    let ledger = open_ledger(ledger_path)?;

    let count = match format {
        ExportFormat::Json => ledger.export_json(output)?,
        ExportFormat::Csv => ledger.export_csv(output)?,
    };

    println!("📤 Exported {} donation(s) to {}", count, output.display());
    Ok(())
}
