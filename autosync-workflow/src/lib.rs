//! autosync-workflow: the orchestration layer around the retrieval engine.
//!
//! The retrieval engine answers questions; this crate decides what happens
//! next. It composes four collaborators the engine itself never touches:
//!
//! - **safety**: the rule gate that authorizes (or blocks) automated actions
//! - **booking**: the flat service-slot ledger
//! - **alert**: best-effort outbound notifications
//! - **telemetry**: the live-data monitor that reacts to fault codes
//!
//! [`workflow::AgentWorkflow`] ties them together for interactive queries;
//! [`telemetry::TelemetryMonitor`] does the same for streamed vehicle data.

pub mod alert;
pub mod booking;
pub mod faults;
pub mod safety;
pub mod telemetry;
pub mod workflow;

pub use alert::{Notifier, NullNotifier, WebhookNotifier};
pub use booking::{ServiceSlot, SlotLedger, SlotStatus};
pub use faults::{FaultCatalog, FaultInfo};
pub use safety::{ActionKind, SafetyGate, SafetyVerdict, VehicleContext};
pub use telemetry::{TelemetryFrame, TelemetryMonitor};
pub use workflow::{AgentWorkflow, AnalysisReport, DiagnosticsSearch};
