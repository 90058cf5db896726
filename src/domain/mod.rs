//! Domain layer: entities, media rules, errors.

pub mod entities;
pub mod errors;
pub mod media;

pub use entities::{
    AdviceReport, AnalysisPayload, AnalysisResult, Citation, CitationRef, Clinic, Identity,
    NewTriageRequest, PatientHistoryEntry, RequestStatus, Role, Session, TranscriptionData,
    TriageRequest, VisualSigns, priority_for_severity, source_for_url,
};
pub use errors::DomainError;
