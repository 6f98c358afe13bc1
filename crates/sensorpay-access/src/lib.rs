//! Sensorpay Access Control - owner/operator gating for privileged operations
//!
//! Each component that needs gating instantiates its own `AccessControl`:
//! exactly one owner, fixed at construction, plus a dynamic set of operators
//! the owner may grant and revoke. Guards are evaluated before any other
//! precondition or mutation, and a failed guard leaves all state untouched.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use sensorpay_types::{AccountId, Event, EventLog};

/// Authorization failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("caller is not the owner")]
    NotOwner,

    #[error("caller is not the operator")]
    NotOperator,
}

pub type Result<T> = std::result::Result<T, AccessError>;

/// One owner plus a dynamic operator set
///
/// Cheap to clone; clones share the same operator set and event log.
#[derive(Clone)]
pub struct AccessControl {
    owner: AccountId,
    operators: Arc<RwLock<HashSet<AccountId>>>,
    events: EventLog,
}

impl AccessControl {
    /// Create a new instance owned by `owner`, emitting into `events`
    pub fn new(owner: AccountId, events: EventLog) -> Self {
        Self {
            owner,
            operators: Arc::new(RwLock::new(HashSet::new())),
            events,
        }
    }

    /// The fixed owner account
    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Grant the operator capability to `account`
    ///
    /// Owner-only. Idempotent: granting an already-granted account succeeds
    /// and re-emits the notification.
    pub async fn grant(&self, caller: &AccountId, account: AccountId) -> Result<()> {
        self.require_owner(caller)?;

        let mut operators = self.operators.write().await;
        operators.insert(account.clone());
        drop(operators);

        info!(%account, "operator granted");
        self.events
            .append(Event::OperatorGranted { account })
            .await;
        Ok(())
    }

    /// Revoke the operator capability from `account`
    ///
    /// Owner-only and idempotent, like [`grant`](Self::grant).
    pub async fn revoke(&self, caller: &AccountId, account: AccountId) -> Result<()> {
        self.require_owner(caller)?;

        let mut operators = self.operators.write().await;
        operators.remove(&account);
        drop(operators);

        info!(%account, "operator revoked");
        self.events
            .append(Event::OperatorRevoked { account })
            .await;
        Ok(())
    }

    /// Whether `account` is the owner
    pub fn is_owner(&self, account: &AccountId) -> bool {
        &self.owner == account
    }

    /// Whether `account` currently holds the operator capability
    pub async fn is_operator(&self, account: &AccountId) -> bool {
        self.operators.read().await.contains(account)
    }

    /// Guard: fail unless `caller` is the owner
    pub fn require_owner(&self, caller: &AccountId) -> Result<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(AccessError::NotOwner)
        }
    }

    /// Guard: fail unless `caller` is an operator
    pub async fn require_operator(&self, caller: &AccountId) -> Result<()> {
        if self.is_operator(caller).await {
            Ok(())
        } else {
            Err(AccessError::NotOperator)
        }
    }
}
