/*!
# Donation Records

A `DonationRecord` is written once per payment outcome. Everything except
`status` is fixed at creation, and `status` only moves forward:

```text
pending ──► completed ──► refunded
   │
   ├──────► failed
   └──────► refunded
```
*/

use crate::errors::{LedgerError, LedgerResult};
use chrono::{DateTime, SubsecRound, Utc};
use donation_forms::{
    Currency, Frequency, PaymentMethod, ValidatedDonation, MAX_DONATION_AMOUNT,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const RECORD_ID_PREFIX: &str = "don_";
pub const RECEIPT_PREFIX: &str = "RCPT";

/// The ledger keeps timestamps to the millisecond
pub const TIMESTAMP_PRECISION_DIGITS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl RecordStatus {
    pub fn all() -> &'static [RecordStatus] {
        &[
            RecordStatus::Pending,
            RecordStatus::Completed,
            RecordStatus::Failed,
            RecordStatus::Refunded,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Completed => "completed",
            RecordStatus::Failed => "failed",
            RecordStatus::Refunded => "refunded",
        }
    }

    /// No further transitions out of this status
    pub fn is_final(&self) -> bool {
        matches!(self, RecordStatus::Failed | RecordStatus::Refunded)
    }

    /// Whether `self -> next` is allowed; re-applying the same status always is
    pub fn can_transition_to(&self, next: RecordStatus) -> bool {
        use RecordStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Pending, Completed) | (Pending, Failed) | (Pending, Refunded) | (Completed, Refunded)
            )
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> LedgerResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RecordStatus::Pending),
            "completed" => Ok(RecordStatus::Completed),
            "failed" => Ok(RecordStatus::Failed),
            "refunded" => Ok(RecordStatus::Refunded),
            other => Err(LedgerError::Serialization(format!(
                "Unknown donation status: {}",
                other
            ))),
        }
    }
}

/// One persisted donation
///
/// Serialized in camelCase, the shape the donation page kept in local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub receipt_number: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub donor_name: String,
    pub donor_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_phone: Option<String>,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    pub payment_method: PaymentMethod,
    pub status: RecordStatus,
    pub timestamp: DateTime<Utc>,
}

impl DonationRecord {
    /// New record for a donation, stamped now with a fresh id and receipt number
    pub fn from_donation(
        donation: &ValidatedDonation,
        status: RecordStatus,
        transaction_id: Option<String>,
    ) -> Self {
        let timestamp = Utc::now().trunc_subsecs(TIMESTAMP_PRECISION_DIGITS);
        Self {
            id: generate_record_id(),
            transaction_id,
            receipt_number: generate_receipt_number(timestamp),
            amount: donation.amount,
            currency: donation.currency,
            donor_name: donation.donor.name.clone(),
            donor_email: donation.donor.email.clone(),
            donor_phone: donation.donor.phone.clone(),
            recurring: donation.recurring,
            frequency: if donation.recurring {
                donation.frequency
            } else {
                None
            },
            payment_method: donation.payment_method,
            status,
            timestamp,
        }
    }

    /// Record for a captured payment
    pub fn completed(donation: &ValidatedDonation, transaction_id: &str) -> Self {
        Self::from_donation(
            donation,
            RecordStatus::Completed,
            Some(transaction_id.to_string()),
        )
    }

    /// Record for a payment that did not go through
    pub fn failed(donation: &ValidatedDonation) -> Self {
        Self::from_donation(donation, RecordStatus::Failed, None)
    }

    /// Amount formatted for receipts, e.g. `$25.00`
    pub fn display_amount(&self) -> String {
        self.currency.format(self.amount)
    }

    /// Structural checks applied before a record is stored
    pub fn validate(&self) -> LedgerResult<()> {
        if !is_record_id(&self.id) {
            return Err(LedgerError::Serialization(format!(
                "Invalid donation id: {}",
                self.id
            )));
        }
        if !is_receipt_number(&self.receipt_number) {
            return Err(LedgerError::Serialization(format!(
                "Invalid receipt number: {}",
                self.receipt_number
            )));
        }
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::Serialization(format!(
                "Donation {} has a non-positive amount",
                self.id
            )));
        }
        if self.amount.normalize().scale() > 2 {
            return Err(LedgerError::Serialization(format!(
                "Donation {} amount {} has more than 2 decimal places",
                self.id, self.amount
            )));
        }
        if self.amount > MAX_DONATION_AMOUNT {
            return Err(LedgerError::Serialization(format!(
                "Donation {} amount {} exceeds {}",
                self.id, self.amount, MAX_DONATION_AMOUNT
            )));
        }
        if self.donor_email.trim().is_empty() {
            return Err(LedgerError::Serialization(format!(
                "Donation {} has no donor email",
                self.id
            )));
        }
        Ok(())
    }
}

// ================================================================================================
// Identifiers
// ================================================================================================

/// `don_` followed by 16 lowercase hex characters
pub fn generate_record_id() -> String {
    format!("{}{}", RECORD_ID_PREFIX, hex::encode(rand::random::<[u8; 8]>()))
}

/// `RCPT-YYYYMMDD-XXXXXX` with 6 uppercase hex characters
pub fn generate_receipt_number(at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}",
        RECEIPT_PREFIX,
        at.format("%Y%m%d"),
        hex::encode_upper(rand::random::<[u8; 3]>())
    )
}

pub fn is_record_id(id: &str) -> bool {
    id.strip_prefix(RECORD_ID_PREFIX)
        .map(|rest| rest.len() == 16 && rest.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

pub fn is_receipt_number(receipt: &str) -> bool {
    let parts: Vec<&str> = receipt.split('-').collect();
    match parts.as_slice() {
        [prefix, date, suffix] => {
            *prefix == RECEIPT_PREFIX
                && date.len() == 8
                && date.chars().all(|c| c.is_ascii_digit())
                && suffix.len() == 6
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        }
        _ => false,
    }
}
