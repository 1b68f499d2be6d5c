/*!
# Donation Ledger

Persisted record of every donation outcome, with the reports the site needs:
aggregate stats, monthly totals and a donor's own history.

```rust
use donation_forms::{Currency, DonorInfo, PaymentMethod, ValidatedDonation};
use donation_ledger::{DonationLedger, DonationRecord, RecordStatus};
use rust_decimal::dec;

# fn example() -> donation_ledger::LedgerResult<()> {
let donation = ValidatedDonation {
    amount: dec!(1000),
    currency: Currency::Inr,
    donor: DonorInfo {
        name: "Asha Rao".to_string(),
        email: "asha@example.org".to_string(),
        phone: None,
    },
    recurring: false,
    frequency: None,
    payment_method: PaymentMethod::Razorpay,
};

let mut ledger = DonationLedger::create_in_memory()?;
let record = DonationRecord::completed(&donation, "pay_29QQoUBi66xm2f");
ledger.insert(&record)?;
ledger.update_status(&record.id, RecordStatus::Refunded)?;

let stats = ledger.stats()?;
assert_eq!(stats.count(RecordStatus::Refunded), 1);
# Ok(())
# }
```
*/

pub mod database;
pub mod errors;
pub mod exchange;
pub mod record;
pub mod schema;
pub mod stats;

pub use database::{DonationLedger, ImportSummary};
pub use errors::{LedgerError, LedgerResult};
pub use exchange::{
    read_records_json, read_records_json_file, write_records_csv, write_records_csv_file,
    write_records_json, write_records_json_file, DONATIONS_CSV_HEADERS,
};
pub use record::{
    generate_receipt_number, generate_record_id, is_receipt_number, is_record_id,
    DonationRecord, RecordStatus,
};
pub use stats::{monthly_totals, DonationStats, MonthlyTotal};
