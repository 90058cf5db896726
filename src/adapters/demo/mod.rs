//! Demo adapters: the fully client-side variant of the system. Identity,
//! storage, and the triage backend are replaced by fixed-delay stubs so the
//! whole flow runs without any external service. Selected in main when no
//! backend is configured (or TRIAGE_DEMO=true).

pub mod heuristics;

use crate::domain::{
    Clinic, DomainError, Identity, NewTriageRequest, PatientHistoryEntry, RequestStatus,
    TriageRequest, priority_for_severity,
};
use crate::ports::{AuthPort, ProgressFn, StatusResponse, StoragePort, TriageBackend};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Transcript the demo pretends to have extracted from the uploaded video.
const SAMPLE_TRANSCRIPT: &str = "I've had a fever and a mild headache since yesterday evening, \
     and I feel a bit more tired than usual.";

/// Demo identity provider: accepts any credentials after a fixed delay.
pub struct DemoIdentity {
    delay: Duration,
}

impl DemoIdentity {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl AuthPort for DemoIdentity {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<Identity, DomainError> {
        info!(email, "[DEMO] simulating sign-in");
        tokio::time::sleep(self.delay).await;
        let local = email.split('@').next().unwrap_or("patient");
        Ok(Identity {
            uid: format!("demo_{local}"),
            email: email.to_string(),
            token: "demo-token".to_string(),
        })
    }
}

/// Demo storage: reads nothing over the network, just walks the local file
/// size in simulated chunks so the progress bar has something to show.
pub struct DemoStorage {
    total_delay: Duration,
}

impl DemoStorage {
    pub fn new(total_delay: Duration) -> Self {
        Self { total_delay }
    }
}

const DEMO_UPLOAD_STEPS: u64 = 20;

#[async_trait::async_trait]
impl StoragePort for DemoStorage {
    async fn upload_video(
        &self,
        local: &Path,
        dest_path: &str,
        _token: &str,
        on_progress: ProgressFn<'_>,
    ) -> Result<String, DomainError> {
        let total = tokio::fs::metadata(local)
            .await
            .map_err(|e| DomainError::Storage(format!("cannot read {}: {e}", local.display())))?
            .len()
            .max(1);

        let step = (total / DEMO_UPLOAD_STEPS).max(1);
        let pause = self.total_delay / DEMO_UPLOAD_STEPS as u32;
        let mut sent = 0u64;
        while sent < total {
            tokio::time::sleep(pause).await;
            sent = (sent + step).min(total);
            on_progress(sent, total);
        }

        Ok(format!("demo://storage/{dest_path}"))
    }
}

struct DemoRequest {
    request_id: String,
    patient_id: String,
    video_storage_path: String,
    reported_symptoms: Vec<String>,
    submitted: Instant,
    created_at: DateTime<Utc>,
}

impl DemoRequest {
    fn status_after(&self, analysis_delay: Duration) -> RequestStatus {
        let elapsed = self.submitted.elapsed();
        if elapsed >= analysis_delay {
            RequestStatus::Completed
        } else if elapsed >= analysis_delay / 2 {
            RequestStatus::Processing
        } else {
            RequestStatus::Pending
        }
    }
}

/// Demo triage backend: in-memory requests that complete after a fixed delay,
/// analyzed with the keyword heuristics.
pub struct DemoBackend {
    analysis_delay: Duration,
    requests: Mutex<Vec<DemoRequest>>,
    counter: AtomicU64,
}

impl DemoBackend {
    pub fn new(analysis_delay: Duration) -> Self {
        Self {
            analysis_delay,
            requests: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait::async_trait]
impl TriageBackend for DemoBackend {
    async fn create_request(
        &self,
        _token: &str,
        request: &NewTriageRequest,
    ) -> Result<String, DomainError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let request_id = format!(
            "triage_{:08x}{:04x}",
            Utc::now().timestamp_millis() as u32,
            n as u16
        );
        info!(request_id = %request_id, "[DEMO] triage request registered");

        self.requests.lock().unwrap().push(DemoRequest {
            request_id: request_id.clone(),
            patient_id: request.patient_id.clone(),
            video_storage_path: request.video_storage_path.clone(),
            reported_symptoms: request.symptoms.clone(),
            submitted: Instant::now(),
            created_at: Utc::now(),
        });
        Ok(request_id)
    }

    async fn get_status(
        &self,
        _token: &str,
        request_id: &str,
    ) -> Result<StatusResponse, DomainError> {
        let requests = self.requests.lock().unwrap();
        let request = requests
            .iter()
            .find(|r| r.request_id == request_id)
            .ok_or_else(|| DomainError::Backend(format!("unknown request {request_id}")))?;

        let status = request.status_after(self.analysis_delay);
        let analysis_result = if status == RequestStatus::Completed {
            Some(heuristics::analyze_transcript(
                SAMPLE_TRANSCRIPT,
                &request.reported_symptoms,
            ))
        } else {
            None
        };

        Ok(StatusResponse {
            status,
            analysis_result,
        })
    }

    async fn list_queue(
        &self,
        _token: &str,
        status: RequestStatus,
    ) -> Result<Vec<TriageRequest>, DomainError> {
        let requests = self.requests.lock().unwrap();
        let entries = requests
            .iter()
            .filter(|r| r.status_after(self.analysis_delay) == status)
            .map(|r| {
                let symptoms = heuristics::detect_symptoms(SAMPLE_TRANSCRIPT);
                let severity = heuristics::infer_severity(SAMPLE_TRANSCRIPT, symptoms.len());
                TriageRequest {
                    request_id: r.request_id.clone(),
                    patient_id: r.patient_id.clone(),
                    status,
                    video_storage_path: r.video_storage_path.clone(),
                    priority: priority_for_severity(severity).to_string(),
                    symptoms,
                    severity: severity.to_string(),
                    visual_signs: String::new(),
                    summary: format!("Self-recorded symptom video; estimated {severity} severity."),
                    created_at: Some(r.created_at),
                }
            })
            .collect();
        Ok(entries)
    }

    async fn patient_history(
        &self,
        _token: &str,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<PatientHistoryEntry>, DomainError> {
        let requests = self.requests.lock().unwrap();
        let mut entries: Vec<PatientHistoryEntry> = requests
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .map(|r| {
                let status = r.status_after(self.analysis_delay);
                let symptoms = heuristics::detect_symptoms(SAMPLE_TRANSCRIPT);
                let severity = heuristics::infer_severity(SAMPLE_TRANSCRIPT, symptoms.len());
                PatientHistoryEntry {
                    request_id: r.request_id.clone(),
                    status,
                    priority: priority_for_severity(severity).to_string(),
                    symptoms,
                    recommendation: (status == RequestStatus::Completed)
                        .then(|| "Rest, stay hydrated, and monitor your symptoms.".to_string()),
                    created_at: Some(r.created_at),
                }
            })
            .collect();
        entries.reverse(); // most recent first
        entries.truncate(limit);
        Ok(entries)
    }

    async fn nearby_clinics(&self, _token: &str) -> Result<Vec<Clinic>, DomainError> {
        Ok(vec![
            Clinic {
                name: "West Chester General Hospital".to_string(),
                address: "123 Main St, Santa Barbara, CA".to_string(),
            },
            Clinic {
                name: "Christ Church Hospital".to_string(),
                address: "456 Oak Ave, Santa Barbara, CA".to_string(),
            },
        ])
    }
}
