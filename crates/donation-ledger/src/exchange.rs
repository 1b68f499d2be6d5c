/*!
# JSON & CSV Exchange

JSON is a plain array of records, the same shape the donation page stored in
the browser. CSV is a flat report with one row per donation and is export-only.
*/

use crate::{
    errors::{LedgerError, LedgerResult},
    record::{DonationRecord, TIMESTAMP_PRECISION_DIGITS},
};
use chrono::SubsecRound;
use csv::WriterBuilder;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Column order of the CSV report
pub const DONATIONS_CSV_HEADERS: &[&str] = &[
    "id",
    "receipt_number",
    "timestamp",
    "status",
    "amount",
    "currency",
    "payment_method",
    "transaction_id",
    "donor_name",
    "donor_email",
    "donor_phone",
    "recurring",
    "frequency",
];

#[derive(Debug, Serialize)]
struct DonationCsvRow<'a> {
    id: &'a str,
    receipt_number: &'a str,
    timestamp: String,
    status: &'static str,
    amount: String,
    currency: &'static str,
    payment_method: &'static str,
    transaction_id: &'a str,
    donor_name: &'a str,
    donor_email: &'a str,
    donor_phone: &'a str,
    recurring: bool,
    frequency: &'static str,
}

impl<'a> From<&'a DonationRecord> for DonationCsvRow<'a> {
    fn from(record: &'a DonationRecord) -> Self {
        Self {
            id: &record.id,
            receipt_number: &record.receipt_number,
            timestamp: record.timestamp.to_rfc3339(),
            status: record.status.as_str(),
            amount: format!("{:.2}", record.amount),
            currency: record.currency.code(),
            payment_method: record.payment_method.as_str(),
            transaction_id: record.transaction_id.as_deref().unwrap_or_default(),
            donor_name: &record.donor_name,
            donor_email: &record.donor_email,
            donor_phone: record.donor_phone.as_deref().unwrap_or_default(),
            recurring: record.recurring,
            frequency: record.frequency.map(|f| f.as_str()).unwrap_or_default(),
        }
    }
}

// ================================================================================================
// JSON
// ================================================================================================

/// Parse a JSON array of records, rejecting malformed or duplicate entries
///
/// Timestamps are truncated to the millisecond the ledger stores.
pub fn read_records_json<R: Read>(reader: R) -> LedgerResult<Vec<DonationRecord>> {
    let mut records: Vec<DonationRecord> = serde_json::from_reader(reader)?;

    let mut ids = HashSet::new();
    let mut receipts = HashSet::new();
    for record in &mut records {
        record.validate()?;
        record.timestamp = record.timestamp.trunc_subsecs(TIMESTAMP_PRECISION_DIGITS);
        if !ids.insert(record.id.clone()) {
            return Err(LedgerError::Duplicate(record.id.clone()));
        }
        if !receipts.insert(record.receipt_number.clone()) {
            return Err(LedgerError::Duplicate(format!(
                "receipt {}",
                record.receipt_number
            )));
        }
    }

    Ok(records)
}

pub fn write_records_json<W: Write>(writer: W, records: &[DonationRecord]) -> LedgerResult<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

pub fn read_records_json_file<P: AsRef<Path>>(path: P) -> LedgerResult<Vec<DonationRecord>> {
    let file = File::open(path)?;
    read_records_json(BufReader::new(file))
}

pub fn write_records_json_file<P: AsRef<Path>>(
    path: P,
    records: &[DonationRecord],
) -> LedgerResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_records_json(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

// ================================================================================================
// CSV
// ================================================================================================

pub fn write_records_csv<W: Write>(writer: W, records: &[DonationRecord]) -> LedgerResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    // Header written explicitly so an empty ledger still yields a valid report
    wtr.write_record(DONATIONS_CSV_HEADERS)?;
    for record in records {
        wtr.serialize(DonationCsvRow::from(record))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_records_csv_file<P: AsRef<Path>>(
    path: P,
    records: &[DonationRecord],
) -> LedgerResult<()> {
    let file = File::create(path)?;
    write_records_csv(file, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordStatus;
    use donation_forms::{Currency, DonorInfo, Frequency, PaymentMethod, ValidatedDonation};
    use rust_decimal::dec;

    fn record() -> DonationRecord {
        let donation = ValidatedDonation {
            amount: dec!(25),
            currency: Currency::Usd,
            donor: DonorInfo {
                name: "Sam Ortiz, Jr.".to_string(),
                email: "sam@example.com".to_string(),
                phone: None,
            },
            recurring: true,
            frequency: Some(Frequency::Quarterly),
            payment_method: PaymentMethod::PayPal,
        };
        DonationRecord::completed(&donation, "8MC585209K746392H")
    }

    #[test]
    fn test_csv_report() {
        let record = record();
        let mut out = Vec::new();
        write_records_csv(&mut out, std::slice::from_ref(&record)).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), DONATIONS_CSV_HEADERS.join(","));

        let row = lines.next().unwrap();
        assert!(row.contains("25.00,USD,paypal,8MC585209K746392H"));
        // Comma in the name is quoted
        assert!(row.contains("\"Sam Ortiz, Jr.\""));
        assert!(row.ends_with("true,quarterly"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_csv_empty_has_header() {
        let mut out = Vec::new();
        write_records_csv(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap().trim_end(),
            DONATIONS_CSV_HEADERS.join(",")
        );
    }

    #[test]
    fn test_json_rejects_duplicates() {
        let record = record();
        let json = serde_json::to_string(&vec![record.clone(), record]).unwrap();
        assert!(matches!(
            read_records_json(json.as_bytes()),
            Err(LedgerError::Duplicate(_))
        ));
    }

    #[test]
    fn test_json_reads_browser_export() {
        let json = r#"[{
            "id": "don_0123456789abcdef",
            "transactionId": "pay_29QQoUBi66xm2f",
            "receiptNumber": "RCPT-20240115-A1B2C3",
            "amount": "1500.00",
            "currency": "INR",
            "donorName": "Priya Shah",
            "donorEmail": "priya@example.in",
            "paymentMethod": "razorpay",
            "status": "completed",
            "timestamp": "2024-01-15T10:30:00Z"
        }]"#;
        let records = read_records_json(json.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Completed);
        assert_eq!(records[0].amount, dec!(1500));
        assert!(!records[0].recurring);
    }

    #[test]
    fn test_json_truncates_sub_millisecond_timestamps() {
        let json = r#"[{
            "id": "don_0123456789abcdef",
            "receiptNumber": "RCPT-20240115-A1B2C3",
            "amount": "10",
            "currency": "USD",
            "donorName": "A B",
            "donorEmail": "a@b.co",
            "paymentMethod": "paypal",
            "status": "pending",
            "timestamp": "2024-01-15T10:30:00.123456789Z"
        }]"#;
        let records = read_records_json(json.as_bytes()).unwrap();
        assert_eq!(records[0].timestamp.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_json_rejects_duplicate_receipts() {
        let first = record();
        let mut second = record();
        second.receipt_number = first.receipt_number.clone();
        let json = serde_json::to_string(&vec![first, second]).unwrap();
        assert!(matches!(
            read_records_json(json.as_bytes()),
            Err(LedgerError::Duplicate(message)) if message.starts_with("receipt")
        ));
    }

    #[test]
    fn test_json_rejects_bad_receipt() {
        let json = r#"[{
            "id": "don_0123456789abcdef",
            "receiptNumber": "R-1",
            "amount": "10",
            "currency": "USD",
            "donorName": "A B",
            "donorEmail": "a@b.co",
            "paymentMethod": "paypal",
            "status": "pending",
            "timestamp": "2024-01-15T10:30:00Z"
        }]"#;
        assert!(matches!(
            read_records_json(json.as_bytes()),
            Err(LedgerError::Serialization(_))
        ));
    }
}
