//! Event model and append-only event log
//!
//! Every successful state transition emits exactly one event per component.
//! Events are appended only after the mutation has fully applied, so the log
//! never shows a transition that was later aborted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{AccountId, Amount, DeviceId};

/// A notification emitted by a component on a successful state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// An account was granted the operator capability
    OperatorGranted { account: AccountId },
    /// An account had its operator capability revoked
    OperatorRevoked { account: AccountId },
    /// A device was bound to a holder
    DeviceRegistered {
        device_id: DeviceId,
        holder: AccountId,
    },
    /// A device mapping was cleared by its holder
    DeviceDeregistered {
        device_id: DeviceId,
        holder: AccountId,
    },
    /// Funds entered custody
    Deposit { account: AccountId, amount: Amount },
    /// Internal re-bookkeeping between two accounts
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    /// Funds left custody entirely
    Paid {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    /// A sensor data submission was recorded and settled
    DataRecorded {
        device_id: DeviceId,
        operator: AccountId,
        payload: String,
        amount: Amount,
    },
}

/// A single entry in an event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0
    pub sequence: u64,
    /// When the entry was committed
    pub recorded_at: DateTime<Utc>,
    /// The emitted event
    pub event: Event,
}

/// An append-only event log
///
/// Each component owns one, injected at construction, so notifications stay
/// attributable to their emitter. Thread-safe and cheap to clone.
#[derive(Clone, Default)]
pub struct EventLog {
    records: Arc<RwLock<Vec<EventRecord>>>,
}

impl EventLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append an event, assigning it the next sequence number
    pub async fn append(&self, event: Event) -> EventRecord {
        let mut records = self.records.write().await;
        let record = EventRecord {
            sequence: records.len() as u64,
            recorded_at: Utc::now(),
            event,
        };
        records.push(record.clone());
        record
    }

    /// All records, oldest first
    pub async fn all(&self) -> Vec<EventRecord> {
        self.records.read().await.clone()
    }

    /// Number of records in the log
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the log is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// The most recent record, if any
    pub async fn last(&self) -> Option<EventRecord> {
        self.records.read().await.last().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_sequence() {
        let log = EventLog::new();
        let account = AccountId::new();

        let first = log
            .append(Event::Deposit {
                account: account.clone(),
                amount: Amount::new(100),
            })
            .await;
        let second = log
            .append(Event::OperatorGranted {
                account: account.clone(),
            })
            .await;

        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(log.len().await, 2);
    }

    #[tokio::test]
    async fn test_last_reflects_most_recent() {
        let log = EventLog::new();
        assert!(log.last().await.is_none());

        let account = AccountId::new();
        log.append(Event::OperatorGranted {
            account: account.clone(),
        })
        .await;
        log.append(Event::OperatorRevoked {
            account: account.clone(),
        })
        .await;

        let last = log.last().await.unwrap();
        assert_eq!(last.event, Event::OperatorRevoked { account });
    }
}
