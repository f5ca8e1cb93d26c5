//! Device registry.
//!
//! A fixed list of device slots built once from the session configuration.
//! Each slot carries its mutable record behind a short-lived synchronous
//! mutex and an asynchronous operation lock that queues same-device
//! operations in FIFO order.

use crate::config::DeviceSeed;
use crate::types::{Device, DeviceStatus};
use chrono::{DateTime, Utc};
use enroll_core::{DeviceId, DeviceKind, DeviceState, Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Record {
    state: DeviceState,
    last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub(crate) struct DeviceSlot {
    pub(crate) id: DeviceId,
    pub(crate) kind: DeviceKind,
    display_name: String,
    record: Mutex<Record>,
    op_lock: tokio::sync::Mutex<()>,
}

impl DeviceSlot {
    fn new(seed: &DeviceSeed) -> Self {
        Self {
            id: seed.id.clone(),
            kind: seed.kind,
            display_name: seed.name.clone(),
            record: Mutex::new(Record {
                state: seed.state,
                last_sync: seed.last_sync,
            }),
            op_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub(crate) fn state(&self) -> DeviceState {
        self.record().state
    }

    pub(crate) fn snapshot(&self) -> Device {
        let record = self.record();
        Device {
            id: self.id.clone(),
            kind: self.kind,
            display_name: self.display_name.clone(),
            state: record.state,
            last_sync: record.last_sync,
        }
    }

    /// Wait for exclusive use of the device.
    pub(crate) async fn acquire(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.op_lock.lock().await
    }

    /// Move to `next`, stamping the sync time. Returns the previous state and
    /// the status to broadcast.
    pub(crate) fn apply(&self, next: DeviceState) -> (DeviceState, DeviceStatus) {
        let mut record = self.record();
        let previous = record.state;
        debug_assert!(
            previous.can_transition_to(next),
            "illegal transition {previous} -> {next} on {}",
            self.id
        );

        record.state = next;
        record.last_sync = Some(Utc::now());
        (previous, DeviceStatus::from_state(next))
    }

    fn record(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    slots: Vec<DeviceSlot>,
    index: HashMap<DeviceId, usize>,
}

impl Registry {
    pub(crate) fn from_seeds(seeds: &[DeviceSeed]) -> Result<Self> {
        let mut registry = Registry::default();

        for seed in seeds {
            if registry.index.contains_key(&seed.id) {
                return Err(Error::DuplicateDevice(seed.id.to_string()));
            }
            registry.index.insert(seed.id.clone(), registry.slots.len());
            registry.slots.push(DeviceSlot::new(seed));
        }

        Ok(registry)
    }

    pub(crate) fn get(&self, device_id: &str) -> Option<&DeviceSlot> {
        self.index.get(device_id).map(|&i| &self.slots[i])
    }

    /// First slot of `kind` in insertion order.
    pub(crate) fn first_of_kind(&self, kind: DeviceKind) -> Option<&DeviceSlot> {
        self.slots.iter().find(|slot| slot.kind == kind)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &DeviceSlot> {
        self.slots.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
