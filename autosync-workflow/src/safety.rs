//! Rule-based gate for automated actions.
//!
//! Before the system books a service slot on its own, the vehicle state must
//! actually justify it. The rule is deliberately simple: auto-booking is
//! only authorized while the engine is overheating.

use serde::{Deserialize, Serialize};

/// Default coolant temperature (degrees Celsius) above which auto-booking is
/// authorized.
pub const DEFAULT_OVERHEAT_THRESHOLD: f64 = 110.0;

/// Actions that pass through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Automatically book a service slot
    BookService,
    /// Send an outbound alert
    SendAlert,
}

/// Snapshot of vehicle state at decision time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleContext {
    /// Engine coolant temperature in degrees Celsius.
    pub coolant_temp: f64,
}

/// Outcome of a gate check: whether the action may proceed and why.
#[derive(Debug, Clone)]
pub struct SafetyVerdict {
    pub allowed: bool,
    pub reason: String,
}

/// The gate itself. Threshold is configurable; the default matches the
/// overheat rule the rest of the system assumes.
#[derive(Debug, Clone)]
pub struct SafetyGate {
    overheat_threshold: f64,
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self {
            overheat_threshold: DEFAULT_OVERHEAT_THRESHOLD,
        }
    }
}

impl SafetyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, overheat_threshold: f64) -> Self {
        self.overheat_threshold = overheat_threshold;
        self
    }

    /// Validate an action against the current vehicle state.
    pub fn validate(&self, action: ActionKind, context: &VehicleContext) -> SafetyVerdict {
        match action {
            ActionKind::BookService => {
                if context.coolant_temp > self.overheat_threshold {
                    SafetyVerdict {
                        allowed: true,
                        reason: "Safety check passed: high temperature confirmed.".to_string(),
                    }
                } else {
                    SafetyVerdict {
                        allowed: false,
                        reason:
                            "Safety check failed: temperature is normal, booking not authorized."
                                .to_string(),
                    }
                }
            }
            ActionKind::SendAlert => SafetyVerdict {
                allowed: true,
                reason: "Action approved.".to_string(),
            },
        }
    }
}
