//! HTTP triage backend adapter. Bearer-authenticated calls against the
//! backend API: create_triage_request, get_triage_status, get_patient_queue,
//! get_patient_history, get_nearby_clinics.

use crate::domain::{
    Clinic, DomainError, NewTriageRequest, PatientHistoryEntry, RequestStatus, TriageRequest,
};
use crate::ports::{StatusResponse, TriageBackend};
use serde::Deserialize;
use tracing::{info, warn};

pub struct HttpTriageBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTriageBackend {
    /// `base_url` is the backend root; endpoint names are appended to it.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Map a non-success response to a backend error with a body snippet.
    async fn check(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, DomainError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, endpoint = what, "backend returned error");
        Err(DomainError::Backend(format!(
            "{what} failed {status}: {}",
            body.chars().take(200).collect::<String>()
        )))
    }
}

/// Wire value for a status query parameter.
fn status_param(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "PENDING",
        RequestStatus::Processing => "PROCESSING",
        RequestStatus::Completed => "COMPLETED",
        RequestStatus::Error => "ERROR",
    }
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct QueueResponse {
    /// Older backend builds omit this field; absence means success.
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    triage_requests: Vec<TriageRequest>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    requests: Vec<PatientHistoryEntry>,
}

#[derive(Deserialize)]
struct ClinicsResponse {
    #[serde(default)]
    clinics: Vec<Clinic>,
}

#[async_trait::async_trait]
impl TriageBackend for HttpTriageBackend {
    async fn create_request(
        &self,
        token: &str,
        request: &NewTriageRequest,
    ) -> Result<String, DomainError> {
        let response = self
            .client
            .post(self.endpoint("create_triage_request"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| DomainError::Backend(format!("create_triage_request failed: {e}")))?;

        let body: CreateResponse = Self::check(response, "create_triage_request")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Backend(format!("malformed create response: {e}")))?;

        if !body.success {
            return Err(DomainError::Backend(
                body.message
                    .unwrap_or_else(|| "triage request was not created".to_string()),
            ));
        }

        let request_id = body
            .request_id
            .ok_or_else(|| DomainError::Backend("create response missing request_id".to_string()))?;
        info!(request_id = %request_id, "triage request registered");
        Ok(request_id)
    }

    async fn get_status(
        &self,
        token: &str,
        request_id: &str,
    ) -> Result<StatusResponse, DomainError> {
        let response = self
            .client
            .get(self.endpoint("get_triage_status"))
            .bearer_auth(token)
            .query(&[("request_id", request_id)])
            .send()
            .await
            .map_err(|e| DomainError::Backend(format!("get_triage_status failed: {e}")))?;

        Self::check(response, "get_triage_status")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Backend(format!("malformed status response: {e}")))
    }

    async fn list_queue(
        &self,
        token: &str,
        status: RequestStatus,
    ) -> Result<Vec<TriageRequest>, DomainError> {
        let response = self
            .client
            .get(self.endpoint("get_patient_queue"))
            .bearer_auth(token)
            .query(&[("status", status_param(status))])
            .send()
            .await
            .map_err(|e| DomainError::Backend(format!("get_patient_queue failed: {e}")))?;

        let body: QueueResponse = Self::check(response, "get_patient_queue")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Backend(format!("malformed queue response: {e}")))?;

        if body.success == Some(false) {
            return Err(DomainError::Backend(
                "get_patient_queue reported failure".to_string(),
            ));
        }
        Ok(body.triage_requests)
    }

    async fn patient_history(
        &self,
        token: &str,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<PatientHistoryEntry>, DomainError> {
        let response = self
            .client
            .get(self.endpoint("get_patient_history"))
            .bearer_auth(token)
            .query(&[("patient_id", patient_id), ("limit", &limit.to_string())])
            .send()
            .await
            .map_err(|e| DomainError::Backend(format!("get_patient_history failed: {e}")))?;

        let body: HistoryResponse = Self::check(response, "get_patient_history")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Backend(format!("malformed history response: {e}")))?;
        Ok(body.requests)
    }

    async fn nearby_clinics(&self, token: &str) -> Result<Vec<Clinic>, DomainError> {
        let response = self
            .client
            .get(self.endpoint("get_nearby_clinics"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| DomainError::Backend(format!("get_nearby_clinics failed: {e}")))?;

        let body: ClinicsResponse = Self::check(response, "get_nearby_clinics")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Backend(format!("malformed clinics response: {e}")))?;
        Ok(body.clinics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_param_matches_wire_values() {
        assert_eq!(status_param(RequestStatus::Completed), "COMPLETED");
        assert_eq!(status_param(RequestStatus::Pending), "PENDING");
        assert_eq!(status_param(RequestStatus::Error), "ERROR");
    }

    #[test]
    fn queue_response_without_success_field_parses() {
        let body: QueueResponse = serde_json::from_str(
            r#"{"triage_requests": [{"request_id": "r1", "patient_id": "p1", "status": "COMPLETED"}]}"#,
        )
        .unwrap();
        assert_eq!(body.success, None);
        assert_eq!(body.triage_requests.len(), 1);
    }

    #[test]
    fn create_response_defaults_to_failure() {
        let body: CreateResponse = serde_json::from_str("{}").unwrap();
        assert!(!body.success);
        assert!(body.request_id.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = HttpTriageBackend::new("https://api.example/v1/".to_string());
        assert_eq!(
            backend.endpoint("get_triage_status"),
            "https://api.example/v1/get_triage_status"
        );
    }
}
