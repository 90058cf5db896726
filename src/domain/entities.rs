//! Domain entities. Pure data structures for the triage core.
//!
//! No HTTP/UI types here; these are mapped from adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role selected at sign-in. Gates which dashboard runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Provider,
}

/// Authenticated identity returned by the identity provider.
#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    /// Bearer token for backend calls.
    pub token: String,
}

/// In-memory session: identity plus the chosen role. Destroyed on sign-out.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub role: Role,
}

/// Triage request lifecycle status as reported by the backend.
/// `Pending` and `Processing` are non-terminal; `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Error)
    }
}

/// Payload sent when registering a triage request.
#[derive(Debug, Clone, Serialize)]
pub struct NewTriageRequest {
    pub patient_id: String,
    pub video_storage_path: String,
    pub video_url: String,
    pub symptoms: Vec<String>,
}

/// A triage request as listed in the provider queue. Created by the client,
/// mutated only by the backend, read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRequest {
    pub request_id: String,
    pub patient_id: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub video_storage_path: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub visual_signs: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_priority() -> String {
    "normal".to_string()
}

/// One entry of a patient's own request history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientHistoryEntry {
    pub request_id: String,
    pub status: RequestStatus,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A clinic suggestion for the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub name: String,
    pub address: String,
}

/// Raw analysis payload as delivered by the backend. Every field is optional;
/// a partial payload must never fail to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub transcription_data: Option<TranscriptionData>,
    #[serde(default)]
    pub advice_report: Option<AdviceReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionData {
    #[serde(default)]
    pub transcription: String,
    #[serde(default)]
    pub identified_symptoms: Vec<String>,
    /// The backend has emitted both a string and a list here.
    #[serde(default)]
    pub visual_signs: Option<VisualSigns>,
    #[serde(default)]
    pub initial_severity: Option<String>,
}

/// Visual signs arrive as either free text or a list of observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisualSigns {
    Text(String),
    List(Vec<String>),
}

impl VisualSigns {
    /// Normalize to display text. "none detected" counts as empty.
    pub fn into_text(self) -> String {
        let text = match self {
            VisualSigns::Text(t) => t,
            VisualSigns::List(items) => items.join(", "),
        };
        if text.eq_ignore_ascii_case("none detected") {
            String::new()
        } else {
            text
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdviceReport {
    #[serde(default)]
    pub report_text: String,
    #[serde(default)]
    pub citations: Vec<CitationRef>,
}

/// Citation as found on the wire: either a bare URL string or a structured record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CitationRef {
    Record {
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        title: Option<String>,
        url: String,
    },
    Url(String),
}

/// The one canonical citation shape used everywhere in this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Short source name, e.g. "CDC" or "NIH".
    pub source: String,
    pub title: String,
    pub url: String,
}

/// Trusted medical domains, used to derive a short source name from a URL.
const TRUSTED_DOMAINS: &[&str] = &[
    "cdc.gov",
    "nih.gov",
    "mayoclinic.org",
    "who.int",
    "medlineplus.gov",
    "healthline.com",
    "webmd.com",
    "clevelandclinic.org",
    "hopkinsmedicine.org",
];

/// Short source name like "CDC" or "NIH" for a citation URL, "OTHER" if unknown.
pub fn source_for_url(url: &str) -> String {
    for domain in TRUSTED_DOMAINS {
        if url.contains(domain) {
            let stem = domain.split('.').next().unwrap_or(domain);
            return stem.to_uppercase();
        }
    }
    "OTHER".to_string()
}

impl From<CitationRef> for Citation {
    fn from(value: CitationRef) -> Self {
        match value {
            CitationRef::Url(url) => Citation {
                source: source_for_url(&url),
                title: url.clone(),
                url,
            },
            CitationRef::Record { source, title, url } => Citation {
                source: source.unwrap_or_else(|| source_for_url(&url)),
                title: title.unwrap_or_else(|| url.clone()),
                url,
            },
        }
    }
}

/// Flattened analysis view rendered to the user. All fields default to empty
/// until a terminal status is observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub transcription: String,
    pub symptoms: Vec<String>,
    pub visual_signs: String,
    pub severity: String,
    pub recommendations: Vec<String>,
    pub citations: Vec<Citation>,
}

impl AnalysisResult {
    /// Flatten a backend payload. Any missing field becomes its empty default;
    /// severity falls back to "Unknown". Recommendation lines are split from
    /// the report text.
    pub fn from_payload(payload: AnalysisPayload) -> Self {
        let data = payload.transcription_data.unwrap_or_default();
        let report = payload.advice_report.unwrap_or_default();

        Self {
            transcription: data.transcription,
            symptoms: data.identified_symptoms,
            visual_signs: data
                .visual_signs
                .map(VisualSigns::into_text)
                .unwrap_or_default(),
            severity: data
                .initial_severity
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            recommendations: report
                .report_text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
            citations: report.citations.into_iter().map(Citation::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transcription.is_empty()
            && self.symptoms.is_empty()
            && self.visual_signs.is_empty()
            && self.severity.is_empty()
            && self.recommendations.is_empty()
            && self.citations.is_empty()
    }
}

/// Map a severity label onto the queue priority scale. Same table the backend
/// applies after analysis; unknown labels land on "moderate".
pub fn priority_for_severity(severity: &str) -> &'static str {
    match severity.to_lowercase().as_str() {
        "severe" => "critical",
        "moderate" => "moderate",
        "mild" => "low",
        _ => "moderate",
    }
}
