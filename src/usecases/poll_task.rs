//! Cancellable status poll: one backend call per tick until a terminal status.
//!
//! The poll runs as a scoped task aborted on reset and on teardown, so no
//! timer outlives the flow that started it. The first tick fires immediately,
//! subsequent ticks follow the configured interval.

use crate::domain::{AnalysisPayload, DomainError, RequestStatus};
use crate::ports::TriageBackend;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Terminal result of one poll loop.
#[derive(Debug)]
pub enum PollOutcome {
    /// Backend reported COMPLETED; carries the (possibly partial) payload.
    Completed(AnalysisPayload),
    /// Backend reported ERROR.
    Failed,
}

/// Handle to a running poll loop. Aborting (or dropping) the handle stops the
/// timer; no further backend calls are issued after a terminal status.
pub struct PollTask {
    handle: Option<JoinHandle<PollOutcome>>,
}

impl PollTask {
    pub fn spawn(
        backend: Arc<dyn TriageBackend>,
        token: String,
        request_id: String,
        interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match backend.get_status(&token, &request_id).await {
                    Ok(response) => {
                        debug!(request_id = %request_id, status = ?response.status, "poll tick");
                        match response.status {
                            RequestStatus::Completed => {
                                return PollOutcome::Completed(
                                    response.analysis_result.unwrap_or_default(),
                                );
                            }
                            RequestStatus::Error => return PollOutcome::Failed,
                            RequestStatus::Pending | RequestStatus::Processing => {}
                        }
                    }
                    // Transient tick failure: log and try again on the next tick.
                    Err(e) => warn!(request_id = %request_id, error = %e, "poll tick failed"),
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Stop polling without waiting for a terminal status.
    pub fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Wait for the terminal status. Consumes the task.
    pub async fn outcome(mut self) -> Result<PollOutcome, DomainError> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| DomainError::Backend("poll task already consumed".to_string()))?;
        handle
            .await
            .map_err(|e| DomainError::Backend(format!("poll task stopped: {e}")))
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{
        Clinic, NewTriageRequest, PatientHistoryEntry, TranscriptionData, TriageRequest,
    };
    use crate::ports::StatusResponse;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One scripted poll tick.
    #[derive(Clone)]
    pub(crate) enum Step {
        Reply(StatusResponse),
        Fail,
    }

    /// Backend that replays a scripted status sequence and counts calls.
    pub(crate) struct ScriptedBackend {
        steps: Mutex<Vec<Step>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedBackend {
        pub fn new(mut steps: Vec<Step>) -> Self {
            steps.reverse();
            Self {
                steps: Mutex::new(steps),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl TriageBackend for ScriptedBackend {
        async fn create_request(
            &self,
            _token: &str,
            _request: &NewTriageRequest,
        ) -> Result<String, DomainError> {
            Ok("triage_test".to_string())
        }

        async fn get_status(
            &self,
            _token: &str,
            _request_id: &str,
        ) -> Result<StatusResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.steps.lock().unwrap().pop() {
                Some(Step::Reply(response)) => Ok(response),
                Some(Step::Fail) | None => {
                    Err(DomainError::Backend("scripted failure".to_string()))
                }
            }
        }

        async fn list_queue(
            &self,
            _token: &str,
            _status: RequestStatus,
        ) -> Result<Vec<TriageRequest>, DomainError> {
            Ok(Vec::new())
        }

        async fn patient_history(
            &self,
            _token: &str,
            _patient_id: &str,
            _limit: usize,
        ) -> Result<Vec<PatientHistoryEntry>, DomainError> {
            Ok(Vec::new())
        }

        async fn nearby_clinics(&self, _token: &str) -> Result<Vec<Clinic>, DomainError> {
            Ok(Vec::new())
        }
    }

    pub(crate) fn pending() -> Step {
        Step::Reply(StatusResponse {
            status: RequestStatus::Pending,
            analysis_result: None,
        })
    }

    pub(crate) fn completed_with(payload: AnalysisPayload) -> Step {
        Step::Reply(StatusResponse {
            status: RequestStatus::Completed,
            analysis_result: Some(payload),
        })
    }

    pub(crate) fn errored() -> Step {
        Step::Reply(StatusResponse {
            status: RequestStatus::Error,
            analysis_result: None,
        })
    }

    fn completed() -> Step {
        completed_with(AnalysisPayload {
            transcription_data: Some(TranscriptionData {
                transcription: "x".to_string(),
                ..Default::default()
            }),
            advice_report: None,
        })
    }

    fn spawn_over(backend: &Arc<ScriptedBackend>, interval_ms: u64) -> PollTask {
        PollTask::spawn(
            Arc::clone(backend) as Arc<dyn TriageBackend>,
            "tok".to_string(),
            "triage_test".to_string(),
            Duration::from_millis(interval_ms),
        )
    }

    #[tokio::test]
    async fn polling_stops_after_first_terminal_status() {
        let backend = Arc::new(ScriptedBackend::new(vec![pending(), pending(), completed()]));
        let task = spawn_over(&backend, 10);

        let outcome = task.outcome().await.unwrap();
        assert!(matches!(outcome, PollOutcome::Completed(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);

        // No further calls strictly after the terminal status was observed.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn error_status_yields_failed_outcome() {
        let backend = Arc::new(ScriptedBackend::new(vec![errored()]));
        let task = spawn_over(&backend, 10);

        let outcome = task.outcome().await.unwrap();
        assert!(matches!(outcome, PollOutcome::Failed));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_tick_failure_keeps_polling() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            pending(),
            Step::Fail,
            completed(),
        ]));
        let task = spawn_over(&backend, 10);

        let outcome = task.outcome().await.unwrap();
        assert!(matches!(outcome, PollOutcome::Completed(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn abort_stops_backend_calls() {
        let backend = Arc::new(ScriptedBackend::new(vec![pending(); 1000]));
        let task = spawn_over(&backend, 5);

        tokio::time::sleep(Duration::from_millis(20)).await;
        task.abort();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let after_abort = backend.calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), after_abort);
    }

    #[tokio::test]
    async fn drop_aborts_the_timer() {
        let backend = Arc::new(ScriptedBackend::new(vec![pending(); 1000]));
        {
            let _task = spawn_over(&backend, 5);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        let after_drop = backend.calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), after_drop);
    }
}
