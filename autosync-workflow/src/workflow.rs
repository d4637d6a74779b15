//! Interactive diagnostics workflow.
//!
//! Given a user query, run the hybrid manual search, decide whether the
//! answer describes a critical condition, and if so walk the automation
//! chain: emergency steps, safety gate, slot lookup. The retrieval engine
//! never calls any of this; the workflow is the only composition point.

use crate::booking::SlotLedger;
use crate::safety::{ActionKind, SafetyGate, VehicleContext};
use anyhow::Result;
use async_trait::async_trait;
use autosync_retriever::HybridEngine;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Keywords that mark a search answer as describing a critical condition.
pub const CRITICAL_KEYWORDS: &[&str] =
    &["P0217", "Overheating", "High Input", "Circuit Malfunction"];

/// Coolant temperature assumed when the caller supplies no vehicle data.
/// Interactive queries about critical faults usually come from a driver
/// already watching a hot gauge.
const ASSUMED_COOLANT_TEMP: f64 = 115.0;

/// Seam between the workflow and the retrieval engine, so the workflow can
/// be exercised against a stub.
#[async_trait]
pub trait DiagnosticsSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

#[async_trait]
impl DiagnosticsSearch for HybridEngine {
    async fn search(&self, query: &str) -> Result<String> {
        Ok(HybridEngine::search(self, query).await?)
    }
}

/// What the assistant did with one query.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// The retrieval engine's answer.
    pub analysis: String,
    /// Emergency steps, present only for critical conditions.
    pub steps: Vec<String>,
    /// Outcome of the auto-booking chain, if it ran.
    pub booking_status: Option<String>,
}

/// Orchestrates search, criticality triage, the safety gate, and booking.
pub struct AgentWorkflow {
    search: Arc<dyn DiagnosticsSearch>,
    ledger: SlotLedger,
    gate: SafetyGate,
}

impl AgentWorkflow {
    pub fn new(search: Arc<dyn DiagnosticsSearch>, ledger: SlotLedger) -> Self {
        Self {
            search,
            ledger,
            gate: SafetyGate::default(),
        }
    }

    pub fn with_gate(mut self, gate: SafetyGate) -> Self {
        self.gate = gate;
        self
    }

    /// Analyze a user query end to end.
    pub async fn analyze(
        &self,
        query: &str,
        vehicle_data: Option<VehicleContext>,
    ) -> Result<AnalysisReport> {
        info!("Agent workflow triggered: {query}");

        let analysis = self.search.search(query).await?;

        if !is_critical(&analysis) {
            return Ok(AnalysisReport {
                analysis,
                steps: Vec::new(),
                booking_status: None,
            });
        }

        let steps = vec![
            "1. STOP the vehicle immediately.".to_string(),
            "2. Check coolant levels.".to_string(),
            "3. Do not open radiator cap while hot.".to_string(),
        ];

        let context = vehicle_data.unwrap_or(VehicleContext {
            coolant_temp: ASSUMED_COOLANT_TEMP,
        });
        let verdict = self.gate.validate(ActionKind::BookService, &context);

        let booking_status = if verdict.allowed {
            match self.ledger.find_available_slot().await? {
                Some(slot) => format!("Slot found at {}. Auto-booking initiated.", slot.time),
                None => "No service slots available.".to_string(),
            }
        } else {
            format!("Booking blocked: {}", verdict.reason)
        };

        Ok(AnalysisReport {
            analysis,
            steps,
            booking_status: Some(booking_status),
        })
    }
}

/// Case-insensitive scan of the search answer for critical keywords.
fn is_critical(analysis: &str) -> bool {
    let lowered = analysis.to_lowercase();
    CRITICAL_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}
