//! Known fault-code catalogue.

use std::collections::HashMap;

/// Description and driver advice for one diagnostic code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultInfo {
    pub code: String,
    pub description: String,
    pub advice: String,
}

/// Lookup table of diagnostic codes the assistant knows how to narrate.
/// Codes outside the table get a generic entry; the manual search remains
/// the authoritative source either way.
#[derive(Debug, Clone)]
pub struct FaultCatalog {
    entries: HashMap<&'static str, (&'static str, &'static str)>,
}

impl Default for FaultCatalog {
    fn default() -> Self {
        let entries = HashMap::from([
            (
                "P0217",
                (
                    "Engine Coolant Over Temperature Condition",
                    "Stop the vehicle immediately to prevent engine damage.",
                ),
            ),
            (
                "P0300",
                (
                    "Random Multiple Cylinder Misfire Detected",
                    "Reduce speed and avoid heavy acceleration.",
                ),
            ),
            (
                "P0115",
                (
                    "Engine Coolant Temperature Circuit Malfunction",
                    "Check coolant levels immediately.",
                ),
            ),
            (
                "P0101",
                (
                    "Mass Air Flow Sensor Performance Problem",
                    "Engine performance may be reduced.",
                ),
            ),
        ]);
        Self { entries }
    }
}

impl FaultCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a code, falling back to a generic entry for unknown codes.
    pub fn lookup(&self, code: &str) -> FaultInfo {
        match self.entries.get(code) {
            Some((description, advice)) => FaultInfo {
                code: code.to_string(),
                description: (*description).to_string(),
                advice: (*advice).to_string(),
            },
            None => FaultInfo {
                code: code.to_string(),
                description: "Critical Unidentified Fault".to_string(),
                advice: format!("Diagnostic code {code} requires manual inspection."),
            },
        }
    }
}
