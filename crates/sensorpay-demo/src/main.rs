//! Sensorpay Demo - wire a full system and replay the canonical scenario
//!
//! Constructs a ledger, a device registry and a settlement hub, delegates the
//! ledger-operator capability to the hub's service account, then runs:
//! deposit -> register device -> grant operator -> settle a submission.
//!
//! ```bash
//! # Internal settlement with defaults
//! sensorpay-demo
//!
//! # Direct payout of 25000 against a 2000000 deposit
//! sensorpay-demo --deposit 2000000 --amount 25000 --payout
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensorpay_ledger::Ledger;
use sensorpay_registry::DeviceRegistry;
use sensorpay_settlement::SettlementHub;
use sensorpay_types::{AccountId, Amount, DeviceId, EventLog};

/// Sensorpay Demo - device-data settlement walkthrough
#[derive(Parser, Debug)]
#[command(name = "sensorpay-demo", about = "Replay a device-data settlement scenario", version)]
struct Args {
    /// Funds the device holder deposits into custody
    #[arg(long, default_value = "1000000", env = "SENSORPAY_DEPOSIT")]
    deposit: u64,

    /// Compensation per data submission
    #[arg(long, default_value = "10000", env = "SENSORPAY_AMOUNT")]
    amount: u64,

    /// Settle by direct payout instead of internal transfer
    #[arg(long, env = "SENSORPAY_PAYOUT")]
    payout: bool,

    /// Device hardware id (32 hex characters)
    #[arg(long, default_value = "00000000000000000000000000000000", env = "SENSORPAY_DEVICE")]
    device: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let device = DeviceId::parse(&args.device)?;

    let bank_owner = AccountId::new();
    let hub_owner = AccountId::new();
    let service_account = AccountId::new();
    let operator = AccountId::new();
    let holder = AccountId::new();

    let ledger_events = EventLog::new();
    let ledger = Ledger::new(bank_owner.clone(), ledger_events.clone());
    let registry = DeviceRegistry::new(EventLog::new());
    let hub = SettlementHub::new(
        hub_owner.clone(),
        service_account.clone(),
        registry.clone(),
        ledger.clone(),
    );

    // Explicit capability delegation at wiring time
    ledger.grant(&bank_owner, service_account).await?;
    hub.grant(&hub_owner, operator.clone()).await?;

    ledger.deposit(&holder, Amount::new(args.deposit)).await?;
    registry.register(&holder, device.clone()).await?;

    let payload = serde_json::json!({ "temperature": 30 }).to_string();
    let amount = Amount::new(args.amount);

    if args.payout {
        hub.submit_data_with_payout(&operator, &device, payload, amount)
            .await?;
    } else {
        hub.submit_data(&operator, &device, payload, amount).await?;
    }

    info!(
        holder_balance = %ledger.balance(&holder).await,
        operator_balance = %ledger.balance(&operator).await,
        treasury = %ledger.treasury().await,
        "settlement complete"
    );

    for record in ledger_events.all().await {
        println!("[ledger #{:>3}] {:?}", record.sequence, record.event);
    }
    for record in hub.events().all().await {
        println!("[hub    #{:>3}] {:?}", record.sequence, record.event);
    }

    Ok(())
}
