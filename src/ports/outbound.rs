//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by the HTTP adapters and the demo adapters.

use crate::domain::{
    AnalysisPayload, Clinic, DomainError, Identity, NewTriageRequest, PatientHistoryEntry,
    RequestStatus, TriageRequest,
};
use std::path::Path;

/// Best-effort upload progress callback: (bytes transferred, total bytes).
/// Purely informational; never relied on for state transitions.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Identity provider. Verifies email/password and issues a bearer token.
#[async_trait::async_trait]
pub trait AuthPort: Send + Sync {
    /// Sign in. On rejection the provider's own message is carried in the error.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, DomainError>;
}

/// Object storage. Streams a local file to a caller-chosen path.
#[async_trait::async_trait]
pub trait StoragePort: Send + Sync {
    /// Upload `local` to `dest_path`, reporting progress per chunk.
    /// Returns a durable retrieval URL on completion.
    async fn upload_video(
        &self,
        local: &Path,
        dest_path: &str,
        token: &str,
        on_progress: ProgressFn<'_>,
    ) -> Result<String, DomainError>;
}

/// Status poll response: terminal statuses carry the analysis payload.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StatusResponse {
    pub status: RequestStatus,
    #[serde(default)]
    pub analysis_result: Option<AnalysisPayload>,
}

/// Triage backend. One capability interface for both the real HTTP backend
/// and the demo stub; selected by configuration.
#[async_trait::async_trait]
pub trait TriageBackend: Send + Sync {
    /// Register a triage request for an uploaded video. Returns the request id.
    async fn create_request(
        &self,
        token: &str,
        request: &NewTriageRequest,
    ) -> Result<String, DomainError>;

    /// Fetch the current status of a request (one poll tick).
    async fn get_status(
        &self,
        token: &str,
        request_id: &str,
    ) -> Result<StatusResponse, DomainError>;

    /// List triage requests with the given status, in backend order.
    async fn list_queue(
        &self,
        token: &str,
        status: RequestStatus,
    ) -> Result<Vec<TriageRequest>, DomainError>;

    /// A patient's own past requests, most recent first.
    async fn patient_history(
        &self,
        token: &str,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<PatientHistoryEntry>, DomainError>;

    /// Clinic suggestions near the patient.
    async fn nearby_clinics(&self, token: &str) -> Result<Vec<Clinic>, DomainError>;
}
