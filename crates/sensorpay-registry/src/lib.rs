//! Sensorpay Registry - unique, holder-bound identities for physical devices
//!
//! A device id maps to at most one holder at a time. Registration is open to
//! any account; only the current holder can clear a mapping, after which the
//! id is available for re-registration by anyone.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use sensorpay_types::{AccountId, DeviceId, Event, EventLog};

/// Errors from registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("device already registered")]
    DeviceAlreadyRegistered,

    #[error("caller is not the device holder")]
    NotDeviceHolder,
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Maps device ids to their current holder
///
/// Cheap to clone; clones share the same device map and event log.
#[derive(Clone)]
pub struct DeviceRegistry {
    devices: Arc<RwLock<HashMap<DeviceId, AccountId>>>,
    events: EventLog,
}

impl DeviceRegistry {
    /// Create an empty registry emitting into `events`
    pub fn new(events: EventLog) -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Bind `device_id` to the caller
    ///
    /// Any caller. Fails if the id currently maps to a holder.
    pub async fn register(&self, caller: &AccountId, device_id: DeviceId) -> Result<()> {
        let mut devices = self.devices.write().await;
        if devices.contains_key(&device_id) {
            return Err(RegistryError::DeviceAlreadyRegistered);
        }
        devices.insert(device_id.clone(), caller.clone());
        drop(devices);

        info!(device = %device_id, holder = %caller, "device registered");
        self.events
            .append(Event::DeviceRegistered {
                device_id,
                holder: caller.clone(),
            })
            .await;
        Ok(())
    }

    /// Clear the mapping for `device_id`
    ///
    /// Only the current holder may deregister. Unknown ids fail the same
    /// way: the caller cannot be the holder of a device that has none.
    pub async fn deregister(&self, caller: &AccountId, device_id: DeviceId) -> Result<()> {
        let mut devices = self.devices.write().await;
        if devices.get(&device_id) != Some(caller) {
            return Err(RegistryError::NotDeviceHolder);
        }
        devices.remove(&device_id);
        drop(devices);

        info!(device = %device_id, holder = %caller, "device deregistered");
        self.events
            .append(Event::DeviceDeregistered {
                device_id,
                holder: caller.clone(),
            })
            .await;
        Ok(())
    }

    /// The current holder of `device_id`, if registered
    pub async fn holder_of(&self, device_id: &DeviceId) -> Option<AccountId> {
        self.devices.read().await.get(device_id).cloned()
    }

    /// Number of currently registered devices
    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(suffix: u8) -> DeviceId {
        DeviceId::parse(&format!("{:032x}", suffix)).unwrap()
    }

    #[tokio::test]
    async fn test_register_binds_caller() {
        let registry = DeviceRegistry::new(EventLog::new());
        let holder = AccountId::new();
        let id = device(1);

        registry.register(&holder, id.clone()).await.unwrap();
        assert_eq!(registry.holder_of(&id).await, Some(holder));
        assert_eq!(registry.device_count().await, 1);
    }

    #[tokio::test]
    async fn test_double_register_rejected() {
        let registry = DeviceRegistry::new(EventLog::new());
        let first = AccountId::new();
        let second = AccountId::new();
        let id = device(1);

        registry.register(&first, id.clone()).await.unwrap();

        let result = registry.register(&second, id.clone()).await;
        assert_eq!(result, Err(RegistryError::DeviceAlreadyRegistered));
        assert_eq!(registry.holder_of(&id).await, Some(first));
    }

    #[tokio::test]
    async fn test_only_holder_may_deregister() {
        let registry = DeviceRegistry::new(EventLog::new());
        let holder = AccountId::new();
        let stranger = AccountId::new();
        let id = device(1);

        registry.register(&holder, id.clone()).await.unwrap();

        let result = registry.deregister(&stranger, id.clone()).await;
        assert_eq!(result, Err(RegistryError::NotDeviceHolder));
        assert_eq!(registry.holder_of(&id).await, Some(holder.clone()));

        registry.deregister(&holder, id.clone()).await.unwrap();
        assert_eq!(registry.holder_of(&id).await, None);
    }

    #[tokio::test]
    async fn test_deregister_unknown_device_rejected() {
        let registry = DeviceRegistry::new(EventLog::new());
        let caller = AccountId::new();

        let result = registry.deregister(&caller, device(9)).await;
        assert_eq!(result, Err(RegistryError::NotDeviceHolder));
    }

    #[tokio::test]
    async fn test_cleared_id_is_reusable_by_another_account() {
        let registry = DeviceRegistry::new(EventLog::new());
        let first = AccountId::new();
        let second = AccountId::new();
        let id = device(1);

        registry.register(&first, id.clone()).await.unwrap();
        registry.deregister(&first, id.clone()).await.unwrap();
        registry.register(&second, id.clone()).await.unwrap();

        assert_eq!(registry.holder_of(&id).await, Some(second));
    }

    #[tokio::test]
    async fn test_events_record_lifecycle() {
        let events = EventLog::new();
        let registry = DeviceRegistry::new(events.clone());
        let holder = AccountId::new();
        let id = device(1);

        registry.register(&holder, id.clone()).await.unwrap();
        registry.deregister(&holder, id.clone()).await.unwrap();

        let records = events.all().await;
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].event,
            Event::DeviceRegistered {
                device_id: id.clone(),
                holder: holder.clone(),
            }
        );
        assert_eq!(
            records[1].event,
            Event::DeviceDeregistered {
                device_id: id,
                holder,
            }
        );
    }
}
