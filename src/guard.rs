//! Single-slot in-flight guard: at most one submission per flow and subject.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Register,
    Login,
    AddFood,
    EditFood,
    EditProfile,
    DeleteFood,
}

type Slot = (Flow, String);

#[derive(Clone, Default)]
pub struct SubmitGuard {
    slots: Arc<Mutex<HashSet<Slot>>>,
}

/// Held for the duration of one submission; the slot frees itself on drop.
#[derive(Debug)]
pub struct SubmitToken {
    slots: Arc<Mutex<HashSet<Slot>>>,
    slot: Slot,
}

impl SubmitGuard {
    pub fn acquire(&self, flow: Flow, subject: impl Into<String>) -> Result<SubmitToken, AppError> {
        let slot = (flow, subject.into());
        if !lock(&self.slots).insert(slot.clone()) {
            warn!(flow = ?slot.0, subject = %slot.1, "submission already in flight");
            return Err(AppError::InFlight);
        }
        debug!(flow = ?slot.0, subject = %slot.1, "submission slot taken");
        Ok(SubmitToken {
            slots: Arc::clone(&self.slots),
            slot,
        })
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        lock(&self.slots).len()
    }
}

impl Drop for SubmitToken {
    fn drop(&mut self) {
        lock(&self.slots).remove(&self.slot);
    }
}

// The set stays consistent even if a holder panicked, so poisoning is ignored.
fn lock(slots: &Mutex<HashSet<Slot>>) -> MutexGuard<'_, HashSet<Slot>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
