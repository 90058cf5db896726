//! Keyword heuristics for the demo backend. Symptom detection is a lookup
//! against a fixed vocabulary; severity comes from severe-keyword presence
//! and a symptom-count threshold. A stub, not a diagnostic engine.

use crate::domain::{AdviceReport, AnalysisPayload, CitationRef, TranscriptionData};

/// Fixed vocabulary: lowercase keyword -> display label.
const SYMPTOM_VOCABULARY: &[(&str, &str)] = &[
    ("fever", "Fever"),
    ("headache", "Headache"),
    ("cough", "Cough"),
    ("sore throat", "Sore throat"),
    ("runny nose", "Runny nose"),
    ("nausea", "Nausea"),
    ("vomit", "Vomiting"),
    ("diarrhea", "Diarrhea"),
    ("dizz", "Dizziness"),
    ("fatigue", "Fatigue"),
    ("tired", "Fatigue"),
    ("chills", "Chills"),
    ("rash", "Rash"),
    ("swelling", "Swelling"),
    ("chest pain", "Chest pain"),
    ("shortness of breath", "Shortness of breath"),
    ("difficulty breathing", "Difficulty breathing"),
];

/// Any of these escalates straight to "severe".
const SEVERE_KEYWORDS: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "difficulty breathing",
    "can't breathe",
    "unconscious",
    "fainted",
    "seizure",
    "severe bleeding",
    "slurred speech",
];

/// How many distinct symptoms push the estimate from "mild" to "moderate".
const MODERATE_THRESHOLD: usize = 3;

/// Distinct symptom labels found in the transcript, in vocabulary order.
pub fn detect_symptoms(transcript: &str) -> Vec<String> {
    let lower = transcript.to_lowercase();
    let mut labels: Vec<String> = Vec::new();
    for (keyword, label) in SYMPTOM_VOCABULARY {
        if lower.contains(keyword) && !labels.iter().any(|l| l == label) {
            labels.push((*label).to_string());
        }
    }
    labels
}

/// Severity estimate: severe keyword wins, then the count threshold.
pub fn infer_severity(transcript: &str, symptom_count: usize) -> &'static str {
    let lower = transcript.to_lowercase();
    if SEVERE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        "severe"
    } else if symptom_count >= MODERATE_THRESHOLD {
        "moderate"
    } else {
        "mild"
    }
}

fn recommendations_for(severity: &str) -> &'static [&'static str] {
    match severity {
        "severe" => &[
            "Seek emergency care now or call your local emergency number.",
            "Do not drive yourself if you feel faint or short of breath.",
        ],
        "moderate" => &[
            "Book an appointment with your primary care provider within 24 hours.",
            "Rest, stay hydrated, and track your temperature.",
            "Seek urgent care if symptoms escalate.",
        ],
        _ => &[
            "Rest, stay hydrated, and monitor your symptoms.",
            "Over-the-counter medication may help with fever or headache.",
            "See a doctor if symptoms worsen or persist beyond 48 hours.",
        ],
    }
}

const DEMO_CITATIONS: &[(&str, &str, &str)] = &[
    (
        "CDC",
        "Caring for common illnesses at home",
        "https://www.cdc.gov/flu/treatment/takingcare.htm",
    ),
    (
        "MAYOCLINIC",
        "Fever: First aid",
        "https://www.mayoclinic.org/first-aid/first-aid-fever/basics/art-20056685",
    ),
    (
        "MEDLINEPLUS",
        "When to seek medical care",
        "https://medlineplus.gov/ency/article/001929.htm",
    ),
];

/// Full demo analysis for a transcript plus any self-reported symptoms.
pub fn analyze_transcript(transcript: &str, reported: &[String]) -> AnalysisPayload {
    let mut symptoms = detect_symptoms(transcript);
    for extra in reported {
        if !symptoms.iter().any(|s| s.eq_ignore_ascii_case(extra)) {
            symptoms.push(extra.clone());
        }
    }

    let severity = infer_severity(transcript, symptoms.len());

    let mut report_lines = vec![format!(
        "Reported symptoms: {}. Severity assessment: {}.",
        if symptoms.is_empty() {
            "none identified".to_string()
        } else {
            symptoms.join(", ")
        },
        severity
    )];
    report_lines.extend(recommendations_for(severity).iter().map(|s| s.to_string()));

    AnalysisPayload {
        transcription_data: Some(TranscriptionData {
            transcription: transcript.to_string(),
            identified_symptoms: symptoms,
            visual_signs: None,
            initial_severity: Some(severity.to_string()),
        }),
        advice_report: Some(AdviceReport {
            report_text: report_lines.join("\n"),
            citations: DEMO_CITATIONS
                .iter()
                .map(|(source, title, url)| CitationRef::Record {
                    source: Some((*source).to_string()),
                    title: Some((*title).to_string()),
                    url: (*url).to_string(),
                })
                .collect(),
        }),
    }
}
