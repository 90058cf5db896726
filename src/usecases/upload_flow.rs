//! Patient upload flow: Idle -> Uploading -> PendingAnalysis -> Complete | Failed.
//!
//! - File selection validates the media type before any state changes
//! - Upload failures return the flow to Idle
//! - Analysis is awaited through a cancellable poll task (see poll_task)
//! - Reset aborts any outstanding poll and clears all result fields

use crate::domain::media::is_video_file;
use crate::domain::{AnalysisResult, DomainError, NewTriageRequest};
use crate::ports::{ProgressFn, StoragePort, TriageBackend};
use crate::usecases::poll_task::{PollOutcome, PollTask};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Upload flow state. Reset transitions back to Idle from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Uploading,
    PendingAnalysis,
    Complete,
    Failed,
}

/// Monotonic percentage gauge for upload progress display. Progress callbacks
/// are best-effort and may arrive out of order; the displayed value never
/// decreases within one upload.
#[derive(Debug, Default)]
pub struct ProgressGauge {
    percent: AtomicU64,
}

impl ProgressGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a progress callback. Returns the clamped display percentage.
    pub fn update(&self, transferred: u64, total: u64) -> u64 {
        let pct = if total == 0 {
            0
        } else {
            (transferred.saturating_mul(100) / total).min(100)
        };
        self.percent.fetch_max(pct, Ordering::SeqCst);
        self.percent.load(Ordering::SeqCst)
    }

    pub fn percent(&self) -> u64 {
        self.percent.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.percent.store(0, Ordering::SeqCst);
    }
}

/// The patient upload workflow. One instance per assessment attempt; views
/// share nothing with it.
pub struct UploadFlow {
    storage: Arc<dyn StoragePort>,
    backend: Arc<dyn TriageBackend>,
    poll_interval: Duration,
    state: FlowState,
    selected: Option<PathBuf>,
    request_id: Option<String>,
    analysis: AnalysisResult,
}

impl UploadFlow {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        backend: Arc<dyn TriageBackend>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            storage,
            backend,
            poll_interval,
            state: FlowState::Idle,
            selected: None,
            request_id: None,
            analysis: AnalysisResult::default(),
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn analysis(&self) -> &AnalysisResult {
        &self.analysis
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Idle -> Uploading -> PendingAnalysis.
    ///
    /// Rejects non-video files without changing state. On upload or
    /// registration failure the flow returns to Idle and the error is
    /// surfaced to the caller. Returns the backend request id.
    pub async fn upload_and_register(
        &mut self,
        local: &Path,
        patient_id: &str,
        token: &str,
        symptoms: Vec<String>,
        on_progress: ProgressFn<'_>,
    ) -> Result<String, DomainError> {
        if !is_video_file(local) {
            return Err(DomainError::InvalidMedia(format!(
                "{}: please select a video file (MP4, MOV, AVI, WebM)",
                local.display()
            )));
        }

        self.state = FlowState::Uploading;
        self.selected = Some(local.to_path_buf());

        let dest_path = storage_path_for(patient_id, local);
        let video_url = match self
            .storage
            .upload_video(local, &dest_path, token, on_progress)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "upload failed, returning to idle");
                self.clear();
                return Err(e);
            }
        };

        info!(path = %dest_path, "video uploaded");

        let request = NewTriageRequest {
            patient_id: patient_id.to_string(),
            video_storage_path: dest_path,
            video_url,
            symptoms,
        };

        match self.backend.create_request(token, &request).await {
            Ok(request_id) => {
                info!(request_id = %request_id, "triage request created");
                self.request_id = Some(request_id.clone());
                self.state = FlowState::PendingAnalysis;
                Ok(request_id)
            }
            Err(e) => {
                warn!(error = %e, "request creation failed, returning to idle");
                self.clear();
                Err(e)
            }
        }
    }

    /// PendingAnalysis -> Complete | Failed. Spawns the poll task and awaits
    /// the first terminal status; result fields are populated only on
    /// Complete. Dropping this future aborts the poll.
    pub async fn await_analysis(&mut self, token: &str) -> Result<FlowState, DomainError> {
        let request_id = self
            .request_id
            .clone()
            .ok_or_else(|| DomainError::Backend("no triage request outstanding".to_string()))?;

        let task = PollTask::spawn(
            Arc::clone(&self.backend),
            token.to_string(),
            request_id,
            self.poll_interval,
        );

        match task.outcome().await? {
            PollOutcome::Completed(payload) => {
                self.analysis = AnalysisResult::from_payload(payload);
                self.state = FlowState::Complete;
            }
            PollOutcome::Failed => {
                self.state = FlowState::Failed;
            }
        }
        Ok(self.state)
    }

    /// Reset from any state: clear the selected file and all result fields,
    /// return to Idle. Any poll started afterwards belongs to a new attempt.
    pub fn reset(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        self.state = FlowState::Idle;
        self.selected = None;
        self.request_id = None;
        self.analysis = AnalysisResult::default();
    }
}

/// Storage destination: videos/{uid}_{epoch_millis}_{filename}.
fn storage_path_for(patient_id: &str, local: &Path) -> String {
    let filename = local
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("video.mp4");
    format!(
        "videos/{}_{}_{}",
        patient_id,
        chrono::Utc::now().timestamp_millis(),
        filename
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalysisPayload, TranscriptionData};
    use crate::usecases::poll_task::tests::{
        ScriptedBackend, completed_with, errored, pending,
    };
    use std::sync::atomic::AtomicUsize;

    struct FakeStorage {
        fail: bool,
        uploads: AtomicUsize,
    }

    impl FakeStorage {
        fn new() -> Self {
            Self {
                fail: false,
                uploads: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                uploads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl StoragePort for FakeStorage {
        async fn upload_video(
            &self,
            _local: &Path,
            dest_path: &str,
            _token: &str,
            on_progress: ProgressFn<'_>,
        ) -> Result<String, DomainError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DomainError::Storage("bucket unavailable".to_string()));
            }
            // Out-of-order callbacks on purpose: display must still be monotonic.
            for transferred in [0u64, 30, 60, 40, 100] {
                on_progress(transferred, 100);
            }
            Ok(format!("https://storage.example/{dest_path}"))
        }
    }

    fn mild_fever_payload() -> AnalysisPayload {
        AnalysisPayload {
            transcription_data: Some(TranscriptionData {
                transcription: "x".to_string(),
                identified_symptoms: vec!["Fever".to_string()],
                visual_signs: None,
                initial_severity: Some("mild".to_string()),
            }),
            advice_report: None,
        }
    }

    fn flow_with(
        storage: FakeStorage,
        backend: Arc<ScriptedBackend>,
    ) -> (UploadFlow, Arc<ScriptedBackend>) {
        let flow = UploadFlow::new(
            Arc::new(storage),
            Arc::clone(&backend) as Arc<dyn TriageBackend>,
            Duration::from_millis(10),
        );
        (flow, backend)
    }

    #[tokio::test]
    async fn non_video_file_is_rejected_without_state_change() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let storage = FakeStorage::new();
        let (mut flow, _) = flow_with(storage, backend);

        let err = flow
            .upload_and_register(Path::new("notes.txt"), "user123", "tok", vec![], &|_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidMedia(_)));
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(flow.analysis().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_returns_to_idle() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let (mut flow, _) = flow_with(FakeStorage::failing(), backend);

        let err = flow
            .upload_and_register(Path::new("clip.mp4"), "user123", "tok", vec![], &|_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Storage(_)));
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(flow.request_id().is_none());
    }

    #[tokio::test]
    async fn pending_pending_completed_populates_result() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            pending(),
            pending(),
            completed_with(mild_fever_payload()),
        ]));
        let (mut flow, backend) = flow_with(FakeStorage::new(), backend);

        flow.upload_and_register(Path::new("clip.mp4"), "user123", "tok", vec![], &|_, _| {})
            .await
            .unwrap();
        assert_eq!(flow.state(), FlowState::PendingAnalysis);

        let state = flow.await_analysis("tok").await.unwrap();
        assert_eq!(state, FlowState::Complete);
        assert_eq!(flow.analysis().severity, "mild");
        assert_eq!(flow.analysis().symptoms, vec!["Fever".to_string()]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn error_on_first_poll_fails_without_results() {
        let backend = Arc::new(ScriptedBackend::new(vec![errored()]));
        let (mut flow, _) = flow_with(FakeStorage::new(), backend);

        flow.upload_and_register(Path::new("clip.mp4"), "user123", "tok", vec![], &|_, _| {})
            .await
            .unwrap();

        let state = flow.await_analysis("tok").await.unwrap();
        assert_eq!(state, FlowState::Failed);
        assert!(flow.analysis().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_results_from_any_state() {
        let backend = Arc::new(ScriptedBackend::new(vec![completed_with(
            mild_fever_payload(),
        )]));
        let (mut flow, _) = flow_with(FakeStorage::new(), backend);

        flow.upload_and_register(Path::new("clip.mp4"), "user123", "tok", vec![], &|_, _| {})
            .await
            .unwrap();
        flow.await_analysis("tok").await.unwrap();
        assert_eq!(flow.state(), FlowState::Complete);
        assert!(!flow.analysis().is_empty());

        flow.reset();
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(flow.analysis().is_empty());
        assert!(flow.request_id().is_none());

        // Reset is also valid straight from PendingAnalysis.
        let backend = Arc::new(ScriptedBackend::new(vec![pending()]));
        let (mut flow, _) = flow_with(FakeStorage::new(), backend);
        flow.upload_and_register(Path::new("clip.mp4"), "user123", "tok", vec![], &|_, _| {})
            .await
            .unwrap();
        assert_eq!(flow.state(), FlowState::PendingAnalysis);
        flow.reset();
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test]
    async fn displayed_progress_is_monotonic() {
        let backend = Arc::new(ScriptedBackend::new(vec![completed_with(
            AnalysisPayload::default(),
        )]));
        let (mut flow, _) = flow_with(FakeStorage::new(), backend);

        let gauge = ProgressGauge::new();
        let mut seen = Vec::new();
        {
            let seen_ref = std::sync::Mutex::new(&mut seen);
            flow.upload_and_register(
                Path::new("clip.mp4"),
                "user123",
                "tok",
                vec![],
                &|transferred, total| {
                    let displayed = gauge.update(transferred, total);
                    seen_ref.lock().unwrap().push(displayed);
                },
            )
            .await
            .unwrap();
        }

        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert_eq!(gauge.percent(), 100);
    }

    #[test]
    fn gauge_clamps_and_handles_zero_total() {
        let gauge = ProgressGauge::new();
        assert_eq!(gauge.update(0, 0), 0);
        assert_eq!(gauge.update(50, 100), 50);
        assert_eq!(gauge.update(20, 100), 50);
        assert_eq!(gauge.update(250, 100), 100);
        gauge.reset();
        assert_eq!(gauge.percent(), 0);
    }

    #[test]
    fn storage_path_embeds_patient_and_filename() {
        let path = storage_path_for("user123", Path::new("/tmp/cough.mp4"));
        assert!(path.starts_with("videos/user123_"));
        assert!(path.ends_with("_cough.mp4"));
    }
}
