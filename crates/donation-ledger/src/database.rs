/*!
# Donation Ledger

SQLite store for donation records. A ledger lives either in memory (persist it
with `save_to_file()`) or in a file. Record fields are written once; only the
status can change afterwards, and only forward.
*/

use crate::{
    exchange,
    record::{DonationRecord, RecordStatus},
    schema::{check_schema, initialize_database},
    stats::{self, DonationStats, MonthlyTotal},
    LedgerError, LedgerResult,
};
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

const SELECT_COLUMNS: &str = "id, transaction_id, receipt_number, amount, currency, donor_name, \
     donor_email, donor_phone, recurring, frequency, payment_method, status, created_at";

/// Outcome of a JSON import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Records whose id was already present
    pub skipped: usize,
}

pub struct DonationLedger {
    conn: Connection,
}

impl DonationLedger {
    /// Open an existing ledger file
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if !path.exists() {
            return Err(LedgerError::InvalidConfig(format!(
                "Ledger file does not exist: {}",
                path.display()
            )));
        }

        let conn = Connection::open(path)
            .map_err(|e| LedgerError::Connection(format!("Failed to open ledger: {}", e)))?;

        let ledger = Self { conn };
        if !ledger.verify_schema()? {
            return Err(LedgerError::InvalidConfig(format!(
                "Ledger file has invalid schema: {}",
                path.display()
            )));
        }

        Ok(ledger)
    }

    /// Open the ledger at `path`, creating it if it does not exist yet
    pub fn open_or_create(path: &Path) -> LedgerResult<Self> {
        if path.exists() {
            Self::open(path)
        } else {
            info!("Creating ledger at {}", path.display());
            Self::create_file(path, false)
        }
    }

    /// Create a new in-memory ledger; use `save_to_file()` to persist
    pub fn create_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            LedgerError::Connection(format!("Failed to create in-memory ledger: {}", e))
        })?;

        initialize_database(&conn)?;

        Ok(Self { conn })
    }

    /// Create a new ledger file, replacing an existing one only when `overwrite` is set
    pub fn create_file(path: &Path, overwrite: bool) -> LedgerResult<Self> {
        if path.exists() {
            if !overwrite {
                return Err(LedgerError::InvalidConfig(format!(
                    "Ledger file already exists (use overwrite=true to replace): {}",
                    path.display()
                )));
            }
            std::fs::remove_file(path)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| LedgerError::Connection(format!("Failed to create ledger file: {}", e)))?;

        initialize_database(&conn)?;

        Ok(Self { conn })
    }

    /// Copy this ledger into a file with the SQLite backup API
    pub fn save_to_file(&self, path: &Path, overwrite: bool) -> LedgerResult<()> {
        if path.exists() {
            if !overwrite {
                return Err(LedgerError::InvalidConfig(format!(
                    "File already exists (use overwrite=true to replace): {}",
                    path.display()
                )));
            }
            std::fs::remove_file(path)?;
        }

        let mut file_conn = Connection::open(path)
            .map_err(|e| LedgerError::Connection(format!("Failed to create output file: {}", e)))?;

        let backup = rusqlite::backup::Backup::new(&self.conn, &mut file_conn)
            .map_err(|e| LedgerError::Connection(format!("Failed to create backup: {}", e)))?;

        backup
            .run_to_completion(5, std::time::Duration::from_millis(250), None)
            .map_err(|e| LedgerError::Connection(format!("Failed to save ledger: {}", e)))?;

        Ok(())
    }

    pub fn verify_schema(&self) -> LedgerResult<bool> {
        check_schema(&self.conn)
    }

    /// Get underlying connection for advanced operations
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ============================================================================================
    // Records
    // ============================================================================================

    pub fn insert(&mut self, record: &DonationRecord) -> LedgerResult<()> {
        record.validate()?;
        if self.contains(&record.id)? {
            return Err(LedgerError::Duplicate(record.id.clone()));
        }
        if self.get_by_receipt(&record.receipt_number)?.is_some() {
            return Err(LedgerError::Duplicate(format!(
                "receipt {}",
                record.receipt_number
            )));
        }

        insert_row(&self.conn, record)?;

        debug!(id = %record.id, status = %record.status, "Inserted donation");
        Ok(())
    }

    pub fn contains(&self, id: &str) -> LedgerResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM donations WHERE id = ?", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, id: &str) -> LedgerResult<Option<DonationRecord>> {
        let sql = format!("SELECT {} FROM donations WHERE id = ?", SELECT_COLUMNS);
        let raw = self.conn.query_row(&sql, [id], RawRecord::from_row).optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// Look up a record by its receipt number
    pub fn get_by_receipt(&self, receipt_number: &str) -> LedgerResult<Option<DonationRecord>> {
        let sql = format!(
            "SELECT {} FROM donations WHERE receipt_number = ?",
            SELECT_COLUMNS
        );
        let raw = self
            .conn
            .query_row(&sql, [receipt_number], RawRecord::from_row)
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// All records, oldest first
    pub fn all(&self) -> LedgerResult<Vec<DonationRecord>> {
        let sql = format!(
            "SELECT {} FROM donations ORDER BY created_at ASC, id ASC",
            SELECT_COLUMNS
        );
        self.query_records(&sql, params![])
    }

    pub fn count(&self) -> LedgerResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM donations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Move a record to `status`
    ///
    /// Only forward transitions are accepted; re-applying the current status
    /// succeeds without touching the row.
    pub fn update_status(&mut self, id: &str, status: RecordStatus) -> LedgerResult<DonationRecord> {
        let tx = self.conn.transaction()?;

        let current: Option<String> = tx
            .query_row("SELECT status FROM donations WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let current = match current {
            Some(raw) => RecordStatus::from_str(&raw)?,
            None => return Err(LedgerError::NotFound(id.to_string())),
        };

        if !current.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition {
                id: id.to_string(),
                from: current,
                to: status,
            });
        }

        if current != status {
            tx.execute(
                "UPDATE donations SET status = ?, updated_at = ? WHERE id = ?",
                params![status.as_str(), Utc::now().timestamp_millis(), id],
            )?;
            info!(id, from = %current, to = %status, "Donation status updated");
        }
        tx.commit()?;

        self.get(id)?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Donations made with `email` (case-insensitive), newest first
    pub fn donor_history(&self, email: &str) -> LedgerResult<Vec<DonationRecord>> {
        let sql = format!(
            "SELECT {} FROM donations WHERE donor_email = ? COLLATE NOCASE \
             ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        );
        self.query_records(&sql, [email.trim()])
    }

    // ============================================================================================
    // Reports
    // ============================================================================================

    pub fn stats(&self) -> LedgerResult<DonationStats> {
        DonationStats::from_records(&self.all()?)
    }

    pub fn monthly_totals(&self) -> LedgerResult<Vec<MonthlyTotal>> {
        stats::monthly_totals(&self.all()?)
    }

    // ============================================================================================
    // Import / Export
    // ============================================================================================

    pub fn export_json(&self, path: &Path) -> LedgerResult<usize> {
        let records = self.all()?;
        exchange::write_records_json_file(path, &records)?;
        info!("Exported {} donations to {}", records.len(), path.display());
        Ok(records.len())
    }

    pub fn export_csv(&self, path: &Path) -> LedgerResult<usize> {
        let records = self.all()?;
        exchange::write_records_csv_file(path, &records)?;
        info!("Exported {} donations to {}", records.len(), path.display());
        Ok(records.len())
    }

    /// Import a JSON array of records; ids already in the ledger are skipped
    ///
    /// The whole file is validated first, then inserted in one transaction. A
    /// new id carrying a receipt number the ledger already holds fails the
    /// import with `Duplicate` and nothing is written.
    pub fn import_json(&mut self, path: &Path) -> LedgerResult<ImportSummary> {
        let records = exchange::read_records_json_file(path)?;
        self.import_records(&records)
    }

    pub fn import_records(&mut self, records: &[DonationRecord]) -> LedgerResult<ImportSummary> {
        let mut summary = ImportSummary::default();
        let tx = self.conn.transaction()?;

        for record in records {
            record.validate()?;
            let exists: Option<i64> = tx
                .query_row("SELECT 1 FROM donations WHERE id = ?", [&record.id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_some() {
                summary.skipped += 1;
                continue;
            }
            let receipt_taken: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM donations WHERE receipt_number = ?",
                    [&record.receipt_number],
                    |row| row.get(0),
                )
                .optional()?;
            if receipt_taken.is_some() {
                return Err(LedgerError::Duplicate(format!(
                    "receipt {} (donation {})",
                    record.receipt_number, record.id
                )));
            }

            insert_row(&tx, record)?;
            summary.inserted += 1;
        }

        tx.commit()?;
        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            "Imported donations"
        );
        Ok(summary)
    }

    fn query_records<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> LedgerResult<Vec<DonationRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawRecord::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

fn insert_row(conn: &Connection, record: &DonationRecord) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO donations (id, transaction_id, receipt_number, amount, currency, \
         donor_name, donor_email, donor_phone, recurring, frequency, payment_method, status, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            record.id,
            record.transaction_id,
            record.receipt_number,
            record.amount.to_string(),
            record.currency.code(),
            record.donor_name,
            record.donor_email,
            record.donor_phone,
            record.recurring,
            record.frequency.map(|f| f.as_str()),
            record.payment_method.as_str(),
            record.status.as_str(),
            record.timestamp.timestamp_millis(),
            Utc::now().timestamp_millis(),
        ],
    )
}

/// Column values as stored, before parsing into domain types
struct RawRecord {
    id: String,
    transaction_id: Option<String>,
    receipt_number: String,
    amount: String,
    currency: String,
    donor_name: String,
    donor_email: String,
    donor_phone: Option<String>,
    recurring: bool,
    frequency: Option<String>,
    payment_method: String,
    status: String,
    created_at: i64,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            transaction_id: row.get(1)?,
            receipt_number: row.get(2)?,
            amount: row.get(3)?,
            currency: row.get(4)?,
            donor_name: row.get(5)?,
            donor_email: row.get(6)?,
            donor_phone: row.get(7)?,
            recurring: row.get(8)?,
            frequency: row.get(9)?,
            payment_method: row.get(10)?,
            status: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_record(self) -> LedgerResult<DonationRecord> {
        let amount = Decimal::from_str(&self.amount).map_err(|e| {
            LedgerError::Serialization(format!("Invalid amount '{}': {}", self.amount, e))
        })?;
        let timestamp = Utc
            .timestamp_millis_opt(self.created_at)
            .single()
            .ok_or_else(|| {
                LedgerError::Serialization(format!("Invalid timestamp {}", self.created_at))
            })?;
        let frequency = self
            .frequency
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: donation_forms::FormError| LedgerError::Serialization(e.to_string()))?;

        Ok(DonationRecord {
            id: self.id,
            transaction_id: self.transaction_id,
            receipt_number: self.receipt_number,
            amount,
            currency: self
                .currency
                .parse()
                .map_err(|e: donation_forms::FormError| LedgerError::Serialization(e.to_string()))?,
            donor_name: self.donor_name,
            donor_email: self.donor_email,
            donor_phone: self.donor_phone,
            recurring: self.recurring,
            frequency,
            payment_method: self
                .payment_method
                .parse()
                .map_err(|e: donation_forms::FormError| LedgerError::Serialization(e.to_string()))?,
            status: self.status.parse()?,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use donation_forms::{Currency, DonorInfo, Frequency, PaymentMethod, ValidatedDonation};
    use rust_decimal::dec;
    use tempfile::TempDir;

    fn donation(email: &str, amount: Decimal) -> ValidatedDonation {
        ValidatedDonation {
            amount,
            currency: Currency::Inr,
            donor: DonorInfo {
                name: "Meera Iyer".to_string(),
                email: email.to_string(),
                phone: None,
            },
            recurring: true,
            frequency: Some(Frequency::Yearly),
            payment_method: PaymentMethod::Razorpay,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut ledger = DonationLedger::create_in_memory().unwrap();
        let record = DonationRecord::completed(&donation("meera@example.in", dec!(1234.50)), "pay_1");
        ledger.insert(&record).unwrap();

        let loaded = ledger.get(&record.id).unwrap().unwrap();
        // Millisecond precision in storage
        assert_eq!(
            loaded.timestamp.timestamp_millis(),
            record.timestamp.timestamp_millis()
        );
        assert_eq!(loaded.amount, dec!(1234.50));
        assert_eq!(loaded.frequency, Some(Frequency::Yearly));
        assert_eq!(loaded.transaction_id.as_deref(), Some("pay_1"));
        assert_eq!(
            ledger.get_by_receipt(&record.receipt_number).unwrap().unwrap().id,
            record.id
        );
        assert!(ledger.get("don_ffffffffffffffff").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut ledger = DonationLedger::create_in_memory().unwrap();
        let record = DonationRecord::failed(&donation("meera@example.in", dec!(100)));
        ledger.insert(&record).unwrap();
        assert!(matches!(
            ledger.insert(&record),
            Err(LedgerError::Duplicate(_))
        ));
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn test_update_status_forward_only() {
        let mut ledger = DonationLedger::create_in_memory().unwrap();
        let record = DonationRecord::from_donation(
            &donation("meera@example.in", dec!(500)),
            RecordStatus::Pending,
            None,
        );
        ledger.insert(&record).unwrap();

        let updated = ledger.update_status(&record.id, RecordStatus::Completed).unwrap();
        assert_eq!(updated.status, RecordStatus::Completed);

        // Same status again is accepted
        ledger.update_status(&record.id, RecordStatus::Completed).unwrap();

        let err = ledger
            .update_status(&record.id, RecordStatus::Pending)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidTransition {
                from: RecordStatus::Completed,
                to: RecordStatus::Pending,
                ..
            }
        ));

        ledger.update_status(&record.id, RecordStatus::Refunded).unwrap();
        assert!(ledger
            .update_status(&record.id, RecordStatus::Completed)
            .is_err());

        assert!(matches!(
            ledger.update_status("don_0000000000000000", RecordStatus::Failed),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_donor_history_case_insensitive_newest_first() {
        let mut ledger = DonationLedger::create_in_memory().unwrap();
        let mut older = DonationRecord::completed(&donation("Meera@Example.in", dec!(100)), "pay_a");
        older.timestamp = Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap();
        let newer = DonationRecord::completed(&donation("meera@example.in", dec!(200)), "pay_b");
        let other = DonationRecord::completed(&donation("someone@example.in", dec!(300)), "pay_c");

        ledger.insert(&older).unwrap();
        ledger.insert(&newer).unwrap();
        ledger.insert(&other).unwrap();

        let history = ledger.donor_history(" MEERA@EXAMPLE.IN ").unwrap();
        let ids: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
        assert!(ledger.donor_history("nobody@example.in").unwrap().is_empty());
    }

    #[test]
    fn test_save_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.db");

        let mut ledger = DonationLedger::create_in_memory().unwrap();
        ledger
            .insert(&DonationRecord::completed(&donation("a@b.in", dec!(750)), "pay_x"))
            .unwrap();
        ledger.save_to_file(&path, false).unwrap();
        assert!(matches!(
            ledger.save_to_file(&path, false),
            Err(LedgerError::InvalidConfig(_))
        ));

        let reopened = DonationLedger::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(reopened.stats().unwrap().total(Currency::Inr), dec!(750));
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.db");
        assert!(matches!(
            DonationLedger::open(&path),
            Err(LedgerError::InvalidConfig(_))
        ));

        let created = DonationLedger::open_or_create(&path).unwrap();
        assert!(created.verify_schema().unwrap());
        assert!(path.exists());
    }
}
