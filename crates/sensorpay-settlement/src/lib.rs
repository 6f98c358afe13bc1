//! Sensorpay Settlement - atomic data submission and operator compensation
//!
//! The settlement hub is the only component that calls across the device
//! registry and the ledger. Each submission runs the pipeline
//!
//! ```text
//! AuthorizeCaller -> ResolveDevice -> InvokeLedger -> EmitEvent
//! ```
//!
//! where every arrow is a guard: a failure at any stage aborts with zero
//! observable mutation. The hub presents its own service account to the
//! ledger; wiring code grants that account ledger-operator rights, so end
//! users never touch the ledger's privileged surface directly.

use thiserror::Error;
use tracing::info;

use sensorpay_access::{AccessControl, AccessError};
use sensorpay_ledger::{Ledger, LedgerError};
use sensorpay_registry::DeviceRegistry;
use sensorpay_types::{AccountId, Amount, DeviceId, Event, EventLog};

/// Errors from settlement operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("device not registered")]
    DeviceNotRegistered,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, SettlementError>;

/// The settlement orchestrator
///
/// Cheap to clone; clones share access control, the wired components and the
/// event log.
#[derive(Clone)]
pub struct SettlementHub {
    /// Identity the hub presents to the ledger
    service_account: AccountId,
    access: AccessControl,
    registry: DeviceRegistry,
    ledger: Ledger,
    events: EventLog,
}

impl SettlementHub {
    /// Wire a hub over an existing registry and ledger
    ///
    /// `service_account` must be granted ledger-operator rights separately
    /// (`ledger.grant(bank_owner, service_account)`); the hub never grants
    /// itself anything.
    pub fn new(
        owner: AccountId,
        service_account: AccountId,
        registry: DeviceRegistry,
        ledger: Ledger,
    ) -> Self {
        let events = EventLog::new();
        Self {
            service_account,
            access: AccessControl::new(owner, events.clone()),
            registry,
            ledger,
            events,
        }
    }

    /// Record a data submission, compensating the caller from the device
    /// holder's internal balance
    ///
    /// Hub-operator-only. The holder's balance decreases and the caller's
    /// increases by exactly `amount`; the treasury is untouched.
    pub async fn submit_data(
        &self,
        caller: &AccountId,
        device_id: &DeviceId,
        payload: String,
        amount: Amount,
    ) -> Result<()> {
        self.access.require_operator(caller).await?;

        let holder = self
            .registry
            .holder_of(device_id)
            .await
            .ok_or(SettlementError::DeviceNotRegistered)?;

        self.ledger
            .transfer(&self.service_account, &holder, caller, amount)
            .await?;

        self.record(device_id, caller, payload, amount).await;
        Ok(())
    }

    /// Record a data submission, paying the caller out of custody from the
    /// device holder's funds
    ///
    /// Hub-operator-only. Identical pipeline, but the settlement leaves the
    /// system entirely and the treasury shrinks.
    pub async fn submit_data_with_payout(
        &self,
        caller: &AccountId,
        device_id: &DeviceId,
        payload: String,
        amount: Amount,
    ) -> Result<()> {
        self.access.require_operator(caller).await?;

        let holder = self
            .registry
            .holder_of(device_id)
            .await
            .ok_or(SettlementError::DeviceNotRegistered)?;

        self.ledger
            .pay(&self.service_account, &holder, caller, amount)
            .await?;

        self.record(device_id, caller, payload, amount).await;
        Ok(())
    }

    // The ledger has fully applied by the time this runs, so the ledger's
    // record always precedes the hub's.
    async fn record(
        &self,
        device_id: &DeviceId,
        operator: &AccountId,
        payload: String,
        amount: Amount,
    ) {
        info!(device = %device_id, %operator, %amount, "data recorded");
        self.events
            .append(Event::DataRecorded {
                device_id: device_id.clone(),
                operator: operator.clone(),
                payload,
                amount,
            })
            .await;
    }

    /// Grant the submission capability to `account` (owner-only)
    pub async fn grant(&self, caller: &AccountId, account: AccountId) -> Result<()> {
        self.access.grant(caller, account).await?;
        Ok(())
    }

    /// Revoke the submission capability from `account` (owner-only)
    pub async fn revoke(&self, caller: &AccountId, account: AccountId) -> Result<()> {
        self.access.revoke(caller, account).await?;
        Ok(())
    }

    /// Whether `account` may submit data through this hub
    pub async fn is_operator(&self, account: &AccountId) -> bool {
        self.access.is_operator(account).await
    }

    /// The identity the hub presents to the ledger
    pub fn service_account(&self) -> &AccountId {
        &self.service_account
    }

    /// The current holder of `device_id`, if registered
    pub async fn holder_of(&self, device_id: &DeviceId) -> Option<AccountId> {
        self.registry.holder_of(device_id).await
    }

    /// The hub's event log
    pub fn events(&self) -> &EventLog {
        &self.events
    }
}
