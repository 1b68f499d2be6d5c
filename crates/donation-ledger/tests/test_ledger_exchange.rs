use donation_forms::{Currency, DonorInfo, Frequency, PaymentMethod, ValidatedDonation};
use donation_ledger::{
    DonationLedger, DonationRecord, LedgerError, RecordStatus, DONATIONS_CSV_HEADERS,
};
use rust_decimal::{dec, Decimal};
use tempfile::TempDir;

fn donation(method: PaymentMethod, amount: Decimal, email: &str) -> ValidatedDonation {
    let currency = match method {
        PaymentMethod::Razorpay => Currency::Inr,
        PaymentMethod::PayPal => Currency::Usd,
    };
    ValidatedDonation {
        amount,
        currency,
        donor: DonorInfo {
            name: "Nina Das".to_string(),
            email: email.to_string(),
            phone: Some("+91-98200-12345".to_string()),
        },
        recurring: method == PaymentMethod::PayPal,
        frequency: Some(Frequency::Monthly),
        payment_method: method,
    }
}

fn populated_ledger() -> DonationLedger {
    let mut ledger = DonationLedger::create_in_memory().unwrap();
    ledger
        .insert(&DonationRecord::completed(
            &donation(PaymentMethod::Razorpay, dec!(500), "nina@example.in"),
            "pay_A1",
        ))
        .unwrap();
    ledger
        .insert(&DonationRecord::completed(
            &donation(PaymentMethod::PayPal, dec!(30), "nina@example.in"),
            "3C679366HH908993F",
        ))
        .unwrap();
    ledger
        .insert(&DonationRecord::failed(&donation(
            PaymentMethod::Razorpay,
            dec!(2500),
            "raj@example.in",
        )))
        .unwrap();
    ledger
}

/// Export to JSON, import into a fresh ledger, and get the same records back
#[test]
fn test_json_export_import() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("donations.json");

    let source = populated_ledger();
    assert_eq!(source.export_json(&json_path).unwrap(), 3);

    let mut target = DonationLedger::create_in_memory().unwrap();
    let summary = target.import_json(&json_path).unwrap();
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.skipped, 0);

    let mut expected = source.all().unwrap();
    let mut actual = target.all().unwrap();
    expected.sort_by(|a, b| a.id.cmp(&b.id));
    actual.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(expected.len(), actual.len());
    for (e, a) in expected.iter().zip(actual.iter()) {
        assert_eq!(e.id, a.id);
        assert_eq!(e.receipt_number, a.receipt_number);
        assert_eq!(e.amount, a.amount);
        assert_eq!(e.status, a.status);
        assert_eq!(e.frequency, a.frequency);
    }

    // A second import of the same file changes nothing
    let again = target.import_json(&json_path).unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.skipped, 3);
    assert_eq!(target.count().unwrap(), 3);
}

#[test]
fn test_import_rejects_malformed_file() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("broken.json");
    std::fs::write(&json_path, r#"{"not": "an array"}"#).unwrap();

    let mut ledger = DonationLedger::create_in_memory().unwrap();
    assert!(matches!(
        ledger.import_json(&json_path),
        Err(LedgerError::Json(_))
    ));
    assert_eq!(ledger.count().unwrap(), 0);
}

#[test]
fn test_csv_export() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("donations.csv");

    let ledger = populated_ledger();
    assert_eq!(ledger.export_csv(&csv_path).unwrap(), 3);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, DONATIONS_CSV_HEADERS);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    let statuses: Vec<&str> = rows.iter().map(|row| &row[3]).collect();
    assert_eq!(statuses.iter().filter(|s| **s == "completed").count(), 2);
    assert!(rows.iter().any(|row| &row[4] == "30.00" && &row[5] == "USD"));
}

#[test]
fn test_reports_after_refund() {
    let mut ledger = populated_ledger();
    let history = ledger.donor_history("NINA@example.in").unwrap();
    assert_eq!(history.len(), 2);

    let paypal = history
        .iter()
        .find(|r| r.payment_method == PaymentMethod::PayPal)
        .unwrap()
        .clone();
    ledger
        .update_status(&paypal.id, RecordStatus::Refunded)
        .unwrap();

    let stats = ledger.stats().unwrap();
    assert_eq!(stats.completed_count(), 1);
    assert_eq!(stats.count(RecordStatus::Refunded), 1);
    assert_eq!(stats.count(RecordStatus::Failed), 1);
    assert_eq!(stats.total(Currency::Usd), Decimal::ZERO);
    assert_eq!(stats.total(Currency::Inr), dec!(500));
    assert_eq!(stats.recurring_count, 0);

    let months = ledger.monthly_totals().unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].currency, Currency::Inr);
    assert_eq!(months[0].total, dec!(500));
}

fn browser_record(id: &str, receipt: &str, amount: &str) -> String {
    format!(
        r#"{{
            "id": "{}",
            "receiptNumber": "{}",
            "amount": "{}",
            "currency": "INR",
            "donorName": "Priya Shah",
            "donorEmail": "priya@example.in",
            "paymentMethod": "razorpay",
            "status": "completed",
            "timestamp": "2024-01-15T10:30:00.123456Z"
        }}"#,
        id, receipt, amount
    )
}

#[test]
fn test_import_rejects_unrepresentable_amounts() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("amounts.json");
    let mut ledger = DonationLedger::create_in_memory().unwrap();

    let sub_cent = browser_record("don_0123456789abcdef", "RCPT-20240115-A1B2C3", "10.555");
    std::fs::write(&json_path, format!("[{}]", sub_cent)).unwrap();
    assert!(matches!(
        ledger.import_json(&json_path),
        Err(LedgerError::Serialization(_))
    ));

    let huge = "79228162514264337593543950335";
    let records = [
        browser_record("don_0123456789abcdef", "RCPT-20240115-A1B2C3", huge),
        browser_record("don_fedcba9876543210", "RCPT-20240115-D4E5F6", huge),
    ];
    std::fs::write(&json_path, format!("[{}]", records.join(","))).unwrap();
    assert!(matches!(
        ledger.import_json(&json_path),
        Err(LedgerError::Serialization(_))
    ));

    assert_eq!(ledger.count().unwrap(), 0);
    assert_eq!(ledger.stats().unwrap().total_records, 0);
}

#[test]
fn test_import_rejects_receipt_collision() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("collision.json");

    let mut ledger = populated_ledger();
    let existing = ledger.all().unwrap().remove(0);
    let records = [
        browser_record("don_00000000000000aa", "RCPT-20240115-A1B2C3", "100"),
        browser_record("don_00000000000000bb", &existing.receipt_number, "100"),
    ];
    std::fs::write(&json_path, format!("[{}]", records.join(","))).unwrap();

    assert!(matches!(
        ledger.import_json(&json_path),
        Err(LedgerError::Duplicate(_))
    ));
    assert_eq!(ledger.count().unwrap(), 3);
    assert!(!ledger.contains("don_00000000000000aa").unwrap());
}

/// Exporting what was imported gives back byte-identical JSON
#[test]
fn test_timestamps_survive_export_import_export() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.json");
    let second = temp_dir.path().join("second.json");

    let mut ledger = populated_ledger();
    let input = temp_dir.path().join("input.json");
    std::fs::write(
        &input,
        format!(
            "[{}]",
            browser_record("don_0123456789abcdef", "RCPT-20240115-A1B2C3", "1500.00")
        ),
    )
    .unwrap();
    ledger.import_json(&input).unwrap();
    ledger.export_json(&first).unwrap();

    let mut copy = DonationLedger::create_in_memory().unwrap();
    copy.import_json(&first).unwrap();
    copy.export_json(&second).unwrap();

    let first: Vec<DonationRecord> =
        serde_json::from_str(&std::fs::read_to_string(&first).unwrap()).unwrap();
    let second: Vec<DonationRecord> =
        serde_json::from_str(&std::fs::read_to_string(&second).unwrap()).unwrap();
    assert_eq!(first, second);

    let imported = copy.get("don_0123456789abcdef").unwrap().unwrap();
    assert_eq!(imported.timestamp.timestamp_subsec_nanos(), 123_000_000);
}
