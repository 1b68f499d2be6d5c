/*!
# Payment Status Tracker

Append-only history of one payment attempt. The last entry is the current
status; once a terminal status (success, failed, cancelled) has been recorded
nothing further can be appended.
*/

use crate::error::{GatewayError, GatewayResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Idle,
    Initiated,
    Processing,
    Retry,
    Success,
    Failed,
    Cancelled,
}

impl PaymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentState::Success | PaymentState::Failed | PaymentState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Idle => "idle",
            PaymentState::Initiated => "initiated",
            PaymentState::Processing => "processing",
            PaymentState::Retry => "retry",
            PaymentState::Success => "success",
            PaymentState::Failed => "failed",
            PaymentState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub state: PaymentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Retries recorded up to and including this entry
    pub retry_count: usize,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentStatusTracker {
    entries: Vec<PaymentStatus>,
}

impl PaymentStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a status; rejected once the history has reached a terminal state
    pub fn record(
        &mut self,
        state: PaymentState,
        message: Option<String>,
        transaction_id: Option<String>,
    ) -> GatewayResult<&PaymentStatus> {
        let current = self.state();
        if current.is_terminal() {
            return Err(GatewayError::TrackerClosed {
                current,
                attempted: state,
            });
        }

        let retry_count = match state {
            PaymentState::Retry => self.retry_count() + 1,
            _ => self.retry_count(),
        };

        self.entries.push(PaymentStatus {
            state,
            message,
            transaction_id,
            retry_count,
            recorded_at: Utc::now(),
        });

        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Last recorded entry, if any
    pub fn current(&self) -> Option<&PaymentStatus> {
        self.entries.last()
    }

    /// Current state; `Idle` before anything has been recorded
    pub fn state(&self) -> PaymentState {
        self.current()
            .map(|status| status.state)
            .unwrap_or(PaymentState::Idle)
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn retry_count(&self) -> usize {
        self.current().map(|status| status.retry_count).unwrap_or(0)
    }

    pub fn entries(&self) -> &[PaymentStatus] {
        &self.entries
    }

    /// Transaction id from the successful capture, if the payment succeeded
    pub fn transaction_id(&self) -> Option<&str> {
        self.current()
            .filter(|status| status.state == PaymentState::Success)
            .and_then(|status| status.transaction_id.as_deref())
    }
}
