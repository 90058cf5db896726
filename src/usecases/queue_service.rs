//! Provider queue view: fetch completed triage requests for review.
//!
//! Display-only. Entries keep the backend's order; no pagination or filtering
//! beyond the completed-status query.

use crate::domain::{DomainError, RequestStatus, TriageRequest};
use crate::ports::TriageBackend;
use std::sync::Arc;
use tracing::info;

pub struct QueueService {
    backend: Arc<dyn TriageBackend>,
}

impl QueueService {
    pub fn new(backend: Arc<dyn TriageBackend>) -> Self {
        Self { backend }
    }

    /// Completed requests in the order the backend returns them.
    pub async fn completed_queue(&self, token: &str) -> Result<Vec<TriageRequest>, DomainError> {
        let queue = self
            .backend
            .list_queue(token, RequestStatus::Completed)
            .await?;
        info!(entries = queue.len(), "patient queue loaded");
        Ok(queue)
    }
}

/// Partially mask a patient identifier for display: first 8 characters only.
pub fn mask_patient_id(patient_id: &str) -> String {
    let visible: String = patient_id.chars().take(8).collect();
    if patient_id.chars().count() > 8 {
        format!("{visible}...")
    } else {
        visible
    }
}
