//! Flat service-slot ledger.
//!
//! The slot table is small and changes rarely, so it is stored as a single
//! JSON array read and written wholesale; no database, no partial updates.
//! A missing ledger file behaves like an empty one (logged, not an error),
//! so a fresh deployment simply has no slots to offer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Booking state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    Available,
    Booked,
}

/// One row of the service-slot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSlot {
    pub slot_id: u32,
    pub date: String,
    pub time: String,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_reg: Option<String>,
}

/// Wholesale-load/wholesale-save slot store.
#[derive(Debug, Clone)]
pub struct SlotLedger {
    path: PathBuf,
}

impl SlotLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Vec<ServiceSlot>> {
        if !self.path.exists() {
            tracing::warn!("Slot ledger not found at {}", self.path.display());
            return Ok(Vec::new());
        }
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading slot ledger {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing slot ledger {}", self.path.display()))
    }

    async fn save(&self, slots: &[ServiceSlot]) -> Result<()> {
        let raw = serde_json::to_string_pretty(slots)?;
        tokio::fs::write(&self.path, raw)
            .await
            .with_context(|| format!("writing slot ledger {}", self.path.display()))?;
        tracing::debug!("Saved {} slots to {}", slots.len(), self.path.display());
        Ok(())
    }

    /// First slot still marked available, in file order.
    pub async fn find_available_slot(&self) -> Result<Option<ServiceSlot>> {
        let slots = self.load().await?;
        Ok(slots
            .into_iter()
            .find(|slot| slot.status == SlotStatus::Available))
    }

    /// Book a slot for a vehicle. Returns `false` when the slot id does not
    /// exist; booking an already-booked slot overwrites the registration,
    /// matching first-wins semantics at the caller.
    pub async fn book_slot(&self, slot_id: u32, registration: &str) -> Result<bool> {
        let mut slots = self.load().await?;
        let Some(slot) = slots.iter_mut().find(|slot| slot.slot_id == slot_id) else {
            return Ok(false);
        };

        slot.status = SlotStatus::Booked;
        slot.vehicle_reg = Some(registration.to_string());
        self.save(&slots).await?;
        tracing::info!("Booked slot {slot_id} for {registration}");
        Ok(true)
    }

    /// All slots ever booked for one vehicle.
    pub async fn history(&self, registration: &str) -> Result<Vec<ServiceSlot>> {
        let slots = self.load().await?;
        Ok(slots
            .into_iter()
            .filter(|slot| slot.vehicle_reg.as_deref() == Some(registration))
            .collect())
    }
}
