/*!
# Ledger Reports

Aggregates over donation records. Amounts are only ever summed within one
currency; only completed donations count towards totals.
*/

use crate::errors::{LedgerError, LedgerResult};
use crate::record::{DonationRecord, RecordStatus};
use chrono::Datelike;
use donation_forms::{Currency, PaymentMethod};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DonationStats {
    /// Every record in the ledger, whatever its status
    pub total_records: usize,
    pub count_by_status: BTreeMap<RecordStatus, usize>,
    /// Sum of completed donations per currency
    pub completed_totals: BTreeMap<Currency, Decimal>,
    /// Mean completed donation per currency, rounded to 2 places
    pub average_donation: BTreeMap<Currency, Decimal>,
    /// Completed donations that are recurring
    pub recurring_count: usize,
    /// Sum of completed donations per payment method
    pub totals_by_method: BTreeMap<PaymentMethod, Decimal>,
    /// Distinct donor emails (case-insensitive) with at least one completed donation
    pub unique_donors: usize,
}

impl DonationStats {
    /// Fails only if a running total leaves the range of `Decimal`
    pub fn from_records(records: &[DonationRecord]) -> LedgerResult<Self> {
        let mut stats = DonationStats {
            total_records: records.len(),
            ..Default::default()
        };
        let mut completed_counts: BTreeMap<Currency, usize> = BTreeMap::new();
        let mut donors = std::collections::BTreeSet::new();

        for record in records {
            *stats.count_by_status.entry(record.status).or_insert(0) += 1;

            if record.status != RecordStatus::Completed {
                continue;
            }
            add_amount(
                stats
                    .completed_totals
                    .entry(record.currency)
                    .or_insert(Decimal::ZERO),
                record,
            )?;
            *completed_counts.entry(record.currency).or_insert(0) += 1;
            add_amount(
                stats
                    .totals_by_method
                    .entry(record.payment_method)
                    .or_insert(Decimal::ZERO),
                record,
            )?;
            if record.recurring {
                stats.recurring_count += 1;
            }
            donors.insert(record.donor_email.trim().to_lowercase());
        }

        for (currency, total) in &stats.completed_totals {
            let count = completed_counts.get(currency).copied().unwrap_or(0);
            if count > 0 {
                stats
                    .average_donation
                    .insert(*currency, (*total / Decimal::from(count)).round_dp(2));
            }
        }
        stats.unique_donors = donors.len();

        Ok(stats)
    }

    pub fn count(&self, status: RecordStatus) -> usize {
        self.count_by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn completed_count(&self) -> usize {
        self.count(RecordStatus::Completed)
    }

    pub fn total(&self, currency: Currency) -> Decimal {
        self.completed_totals
            .get(&currency)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Completed donations in one calendar month (UTC) and currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub currency: Currency,
    pub total: Decimal,
    pub count: usize,
}

impl MonthlyTotal {
    /// `YYYY-MM`
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Monthly totals, oldest month first
pub fn monthly_totals(records: &[DonationRecord]) -> LedgerResult<Vec<MonthlyTotal>> {
    let mut buckets: BTreeMap<(i32, u32, Currency), (Decimal, usize)> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|record| record.status == RecordStatus::Completed)
    {
        let key = (
            record.timestamp.year(),
            record.timestamp.month(),
            record.currency,
        );
        let bucket = buckets.entry(key).or_insert((Decimal::ZERO, 0));
        add_amount(&mut bucket.0, record)?;
        bucket.1 += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|((year, month, currency), (total, count))| MonthlyTotal {
            year,
            month,
            currency,
            total,
            count,
        })
        .collect())
}

fn add_amount(total: &mut Decimal, record: &DonationRecord) -> LedgerResult<()> {
    *total = total.checked_add(record.amount).ok_or_else(|| {
        LedgerError::Overflow(format!(
            "{} total exceeds the supported range at donation {}",
            record.currency, record.id
        ))
    })?;
    Ok(())
}
