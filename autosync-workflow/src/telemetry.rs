//! Live telemetry monitoring.
//!
//! Consumes an ordered stream of OBD frames and reacts to the first frame
//! carrying a diagnostic trouble code: compose a spoken-style alert from the
//! fault catalogue, deliver it best-effort, and attempt a gated emergency
//! booking. The latch is single-shot (one incident, one alert) so a fault
//! that persists across frames does not spam the driver or the ledger.
//! Frame transport (websockets, CAN adapters) is out of scope; callers feed
//! frames in and collect the produced events.

use crate::alert::{Notifier, notify_best_effort};
use crate::booking::SlotLedger;
use crate::faults::FaultCatalog;
use crate::safety::{ActionKind, SafetyGate, VehicleContext};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// One OBD sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub timestamp: String,
    pub rpm: u32,
    pub speed: u32,
    /// Engine coolant temperature in degrees Celsius.
    pub coolant_temp: i32,
    /// Diagnostic trouble code reported by the ECU, when any.
    #[serde(default)]
    pub dtc: Option<String>,
}

/// Load a frame sequence from a JSON file (the simulation feed format).
pub async fn load_frames(path: &Path) -> Result<Vec<TelemetryFrame>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading telemetry feed {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing telemetry feed {}", path.display()))
}

/// What the monitor did in response to a fault frame.
#[derive(Debug, Clone)]
pub struct TelemetryEvent {
    pub code: String,
    pub message: String,
    pub alert_sent: bool,
    pub booking_status: Option<String>,
}

/// Single-shot fault monitor over a telemetry stream.
pub struct TelemetryMonitor {
    catalog: FaultCatalog,
    ledger: SlotLedger,
    gate: SafetyGate,
    notifier: Arc<dyn Notifier>,
    vehicle_reg: String,
    triggered: bool,
}

impl TelemetryMonitor {
    pub fn new(ledger: SlotLedger, notifier: Arc<dyn Notifier>, vehicle_reg: impl Into<String>) -> Self {
        Self {
            catalog: FaultCatalog::new(),
            ledger,
            gate: SafetyGate::default(),
            notifier,
            vehicle_reg: vehicle_reg.into(),
            triggered: false,
        }
    }

    pub fn with_gate(mut self, gate: SafetyGate) -> Self {
        self.gate = gate;
        self
    }

    /// Feed one frame. Returns an event for the first fault frame seen;
    /// healthy frames and repeat faults return `None`.
    pub async fn process_frame(&mut self, frame: &TelemetryFrame) -> Result<Option<TelemetryEvent>> {
        let Some(code) = frame.dtc.as_deref().filter(|c| !c.trim().is_empty()) else {
            return Ok(None);
        };
        if self.triggered {
            return Ok(None);
        }
        self.triggered = true;

        warn!("Failure triggered: {code}");
        let fault = self.catalog.lookup(code);

        let message = format!(
            "Diagnostic trouble code {} detected. {}. Current engine temperature is {} degrees celsius. {} \
             Initiating an emergency service booking for vehicle {}.",
            fault.code, fault.description, frame.coolant_temp, fault.advice, self.vehicle_reg
        );

        let alert_sent = notify_best_effort(self.notifier.as_ref(), &message).await;

        let context = VehicleContext {
            coolant_temp: frame.coolant_temp as f64,
        };
        let verdict = self.gate.validate(ActionKind::BookService, &context);

        let mut booking_status = None;
        if verdict.allowed {
            if let Some(slot) = self.ledger.find_available_slot().await? {
                if self.ledger.book_slot(slot.slot_id, &self.vehicle_reg).await? {
                    info!("Auto-booked slot {}", slot.slot_id);
                    booking_status = Some(format!("Service booked: {} {}", slot.date, slot.time));
                }
            }
        } else {
            info!("Auto-booking withheld: {}", verdict.reason);
        }

        Ok(Some(TelemetryEvent {
            code: fault.code,
            message,
            alert_sent,
            booking_status,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{ServiceSlot, SlotStatus};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_alert(&self, message: &str) -> Result<()> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn frame(temp: i32, dtc: Option<&str>) -> TelemetryFrame {
        TelemetryFrame {
            timestamp: "2026-08-06T10:00:00".to_string(),
            rpm: 2400,
            speed: 60,
            coolant_temp: temp,
            dtc: dtc.map(String::from),
        }
    }

    async fn ledger_with_slot(dir: &TempDir) -> SlotLedger {
        let path = dir.path().join("slots.json");
        let slots = vec![ServiceSlot {
            slot_id: 1,
            date: "2026-08-12".to_string(),
            time: "09:00".to_string(),
            status: SlotStatus::Available,
            vehicle_reg: None,
        }];
        tokio::fs::write(&path, serde_json::to_string(&slots).unwrap())
            .await
            .unwrap();
        SlotLedger::new(path)
    }

    #[tokio::test]
    async fn test_fault_frame_alerts_and_books() {
        let dir = TempDir::new().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let ledger = ledger_with_slot(&dir).await;
        let mut monitor =
            TelemetryMonitor::new(ledger.clone(), notifier.clone(), "TN-22-BJ-2730");

        assert!(monitor.process_frame(&frame(95, None)).await.unwrap().is_none());

        let event = monitor
            .process_frame(&frame(118, Some("P0217")))
            .await
            .unwrap()
            .expect("fault frame should produce an event");

        assert_eq!(event.code, "P0217");
        assert!(event.alert_sent);
        assert!(event.message.contains("Engine Coolant Over Temperature"));
        assert!(event.message.contains("118 degrees"));
        assert_eq!(
            event.booking_status.as_deref(),
            Some("Service booked: 2026-08-12 09:00")
        );

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);

        let history = ledger.history("TN-22-BJ-2730").await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_latch_fires_once() {
        let dir = TempDir::new().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let mut monitor = TelemetryMonitor::new(
            ledger_with_slot(&dir).await,
            notifier.clone(),
            "TN-22-BJ-2730",
        );

        let first = monitor.process_frame(&frame(118, Some("P0300"))).await.unwrap();
        let second = monitor.process_frame(&frame(119, Some("P0300"))).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(notifier.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cool_engine_alerts_but_does_not_book() {
        let dir = TempDir::new().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let ledger = ledger_with_slot(&dir).await;
        let mut monitor = TelemetryMonitor::new(ledger.clone(), notifier, "TN-22-BJ-2730");

        // A sensor fault can be reported while the engine itself is cool;
        // the alert goes out but the gate withholds the booking.
        let event = monitor
            .process_frame(&frame(80, Some("P0101")))
            .await
            .unwrap()
            .unwrap();

        assert!(event.alert_sent);
        assert!(event.booking_status.is_none());
        assert!(ledger.history("TN-22-BJ-2730").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_code_uses_generic_narration() {
        let dir = TempDir::new().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let mut monitor = TelemetryMonitor::new(
            ledger_with_slot(&dir).await,
            notifier,
            "TN-22-BJ-2730",
        );

        let event = monitor
            .process_frame(&frame(120, Some("P1234")))
            .await
            .unwrap()
            .unwrap();
        assert!(event.message.contains("Critical Unidentified Fault"));
    }

    #[tokio::test]
    async fn test_load_frames_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frames.json");
        let frames = vec![frame(90, None), frame(118, Some("P0217"))];
        tokio::fs::write(&path, serde_json::to_string(&frames).unwrap())
            .await
            .unwrap();

        let loaded = load_frames(&path).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].dtc.as_deref(), Some("P0217"));
    }
}
