//! Sensorpay Ledger - custodial balances and the aggregate treasury
//!
//! The ledger keeps two distinct pools that must never be conflated:
//!
//! - per-account balances, bookkeeping of who is owed what
//! - the treasury total, the funds actually held in custody
//!
//! `transfer` moves value between accounts and leaves the treasury alone;
//! `pay` sends funds out of custody entirely and shrinks the treasury.
//!
//! # Invariants
//!
//! 1. No negative balances; a short operation fails in full
//! 2. The treasury equals deposits minus payouts at all times
//! 3. Privileged operations check authorization before anything else

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use sensorpay_access::{AccessControl, AccessError};
use sensorpay_types::{AccountId, Amount, Event, EventLog};

/// Errors from ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("amount exceeds balance")]
    AmountExceedsBalance,

    #[error("amount exceeds bank balance")]
    AmountExceedsBankBalance,

    #[error("balance overflow")]
    BalanceOverflow,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Both financial pools behind one lock, so every mutation is atomic
/// across them.
#[derive(Default)]
struct LedgerState {
    balances: HashMap<AccountId, Amount>,
    treasury: Amount,
}

impl LedgerState {
    fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::zero())
    }
}

/// The sensorpay ledger
///
/// Cheap to clone; clones share the same state, access control and event log.
#[derive(Clone)]
pub struct Ledger {
    access: AccessControl,
    state: Arc<RwLock<LedgerState>>,
    events: EventLog,
}

impl Ledger {
    /// Create an empty ledger owned by `owner`, emitting into `events`
    pub fn new(owner: AccountId, events: EventLog) -> Self {
        Self {
            access: AccessControl::new(owner, events.clone()),
            state: Arc::new(RwLock::new(LedgerState::default())),
            events,
        }
    }

    /// Grant the ledger-operator capability to `account` (owner-only)
    ///
    /// This is how the settlement hub's service account receives standing
    /// authority over the ledger at wiring time.
    pub async fn grant(&self, caller: &AccountId, account: AccountId) -> Result<()> {
        self.access.grant(caller, account).await?;
        Ok(())
    }

    /// Revoke the ledger-operator capability from `account` (owner-only)
    pub async fn revoke(&self, caller: &AccountId, account: AccountId) -> Result<()> {
        self.access.revoke(caller, account).await?;
        Ok(())
    }

    /// Take `amount` of the caller's funds into custody
    ///
    /// Any caller. Credits the caller's balance and the treasury equally.
    pub async fn deposit(&self, caller: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.state.write().await;

        let new_balance = state
            .balance(caller)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        let new_treasury = state
            .treasury
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        state.balances.insert(caller.clone(), new_balance);
        state.treasury = new_treasury;
        drop(state);

        info!(account = %caller, %amount, "deposit");
        self.events
            .append(Event::Deposit {
                account: caller.clone(),
                amount,
            })
            .await;
        Ok(())
    }

    /// Move `amount` from one account to another inside custody
    ///
    /// Operator-only. Pure re-bookkeeping: the treasury total is unchanged
    /// and the sum of all balances is conserved.
    pub async fn transfer(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.access.require_operator(caller).await?;

        let mut state = self.state.write().await;

        let from_balance = state
            .balance(from)
            .checked_sub(amount)
            .ok_or(LedgerError::AmountExceedsBalance)?;
        // A self-transfer must net out, so credit on top of the debited value
        let to_base = if from == to {
            from_balance
        } else {
            state.balance(to)
        };
        let to_balance = to_base
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        state.balances.insert(from.clone(), from_balance);
        state.balances.insert(to.clone(), to_balance);
        drop(state);

        info!(%from, %to, %amount, "internal transfer");
        self.events
            .append(Event::Transfer {
                from: from.clone(),
                to: to.clone(),
                amount,
            })
            .await;
        Ok(())
    }

    /// Pay `amount` out of custody to `to`, debited from `from`
    ///
    /// Operator-only. The treasury guard comes first: the funds must actually
    /// be in custody. The payee's internal balance is untouched; the funds
    /// have left the system.
    pub async fn pay(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.access.require_operator(caller).await?;

        let mut state = self.state.write().await;

        let new_treasury = state
            .treasury
            .checked_sub(amount)
            .ok_or(LedgerError::AmountExceedsBankBalance)?;
        let from_balance = state
            .balance(from)
            .checked_sub(amount)
            .ok_or(LedgerError::AmountExceedsBalance)?;

        state.treasury = new_treasury;
        state.balances.insert(from.clone(), from_balance);
        drop(state);

        info!(%from, %to, %amount, "payout");
        self.events
            .append(Event::Paid {
                from: from.clone(),
                to: to.clone(),
                amount,
            })
            .await;
        Ok(())
    }

    /// The balance of `account`, zero if never seen
    pub async fn balance(&self, account: &AccountId) -> Amount {
        self.state.read().await.balance(account)
    }

    /// The aggregate funds currently held in custody
    pub async fn treasury(&self) -> Amount {
        self.state.read().await.treasury
    }

    /// Whether `account` holds the ledger-operator capability
    pub async fn is_operator(&self, account: &AccountId) -> bool {
        self.access.is_operator(account).await
    }

    /// The ledger owner
    pub fn owner(&self) -> &AccountId {
        self.access.owner()
    }
}
