//! Implements InputPort. Inquire-based interactive prompts: session gate,
//! patient upload flow with progress bar, provider queue view.

use crate::domain::{AnalysisResult, DomainError, Role, Session, TriageRequest};
use crate::ports::{AuthPort, InputPort, StoragePort, TriageBackend};
use crate::usecases::{
    FlowState, ProgressGauge, QueueService, SessionService, UploadFlow, mask_patient_id,
};
use async_trait::async_trait;
use crossterm::style::{Color, Stylize};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Select, Text};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Badge color for a queue priority (fixed four-level scale).
fn priority_color(priority: &str) -> Color {
    match priority {
        "critical" => Color::Red,
        "high" => Color::DarkYellow,
        "moderate" => Color::Yellow,
        _ => Color::Green,
    }
}

fn severity_color(severity: &str) -> Color {
    match severity.to_lowercase().as_str() {
        "severe" => Color::Red,
        "moderate" => Color::Yellow,
        "mild" => Color::Green,
        _ => Color::White,
    }
}

fn prompt_err(e: inquire::InquireError) -> DomainError {
    DomainError::Input(e.to_string())
}

/// Blocking user-facing alert line. Every failure path funnels through here.
fn alert(message: &str) {
    println!("{} {}", "[!]".with(Color::Red), message.with(Color::Red));
}

/// TUI adapter. Inquire prompts over the injected ports.
pub struct TriageTui {
    auth: Arc<dyn AuthPort>,
    storage: Arc<dyn StoragePort>,
    backend: Arc<dyn TriageBackend>,
    poll_interval: Duration,
}

impl TriageTui {
    pub fn new(
        auth: Arc<dyn AuthPort>,
        storage: Arc<dyn StoragePort>,
        backend: Arc<dyn TriageBackend>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            auth,
            storage,
            backend,
            poll_interval,
        }
    }

    /// Session gate: role selection plus credentials. On rejection the
    /// provider's message is shown and the form is offered again; "Exit"
    /// returns None.
    async fn sign_in_prompt(
        &self,
        gate: &mut SessionService,
    ) -> Result<Option<Session>, DomainError> {
        loop {
            let choice = Select::new("I am a:", vec!["Patient", "Healthcare Provider", "Exit"])
                .prompt()
                .map_err(prompt_err)?;

            let role = match choice {
                "Patient" => Role::Patient,
                "Healthcare Provider" => Role::Provider,
                _ => return Ok(None),
            };

            let email = Text::new("Email address:").prompt().map_err(prompt_err)?;
            let password = Password::new("Password:")
                .without_confirmation()
                .prompt()
                .map_err(prompt_err)?;

            match gate.sign_in(email.trim(), &password, role).await {
                Ok(session) => return Ok(Some(session.clone())),
                Err(e) => {
                    error!(error = %e, "sign-in rejected");
                    alert(&format!("Login failed: {e}"));
                }
            }
        }
    }

    async fn patient_dashboard(&self, session: &Session) -> Result<(), DomainError> {
        loop {
            let choice = Select::new(
                "Patient portal:",
                vec![
                    "Upload symptom video",
                    "Past assessments",
                    "Nearby clinics",
                    "Sign out",
                ],
            )
            .prompt()
            .map_err(prompt_err)?;

            match choice {
                "Upload symptom video" => {
                    if let Err(e) = self.run_upload(session).await {
                        error!(error = %e, "upload flow failed");
                        alert(&e.to_string());
                    }
                }
                "Past assessments" => {
                    if let Err(e) = self.show_history(session).await {
                        error!(error = %e, "history fetch failed");
                        alert(&e.to_string());
                    }
                }
                "Nearby clinics" => {
                    if let Err(e) = self.show_clinics(session).await {
                        error!(error = %e, "clinics fetch failed");
                        alert(&e.to_string());
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// One assessment: select file, upload with progress, await analysis.
    async fn run_upload(&self, session: &Session) -> Result<(), DomainError> {
        let path_input = Text::new("Path to your symptom video (MP4, MOV, AVI, WebM):")
            .prompt()
            .map_err(prompt_err)?;
        let path = PathBuf::from(path_input.trim());

        let mut flow = UploadFlow::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.backend),
            self.poll_interval,
        );

        let gauge = ProgressGauge::new();
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("uploading [{bar:40.cyan/blue}] {pos}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        flow.upload_and_register(
            &path,
            &session.identity.uid,
            &session.identity.token,
            Vec::new(),
            &|transferred, total| {
                bar.set_position(gauge.update(transferred, total));
            },
        )
        .await
        .inspect_err(|_| bar.abandon())?;
        bar.finish_and_clear();

        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Analyzing video... this usually takes a minute");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let state = flow.await_analysis(&session.identity.token).await;
        spinner.finish_and_clear();

        match state? {
            FlowState::Complete => {
                render_analysis(flow.analysis());
                Ok(())
            }
            _ => {
                flow.reset();
                Err(DomainError::Backend(
                    "Analysis failed. Please try again.".to_string(),
                ))
            }
        }
    }

    async fn show_history(&self, session: &Session) -> Result<(), DomainError> {
        let entries = self
            .backend
            .patient_history(&session.identity.token, &session.identity.uid, 20)
            .await?;

        if entries.is_empty() {
            println!("No past assessments.");
            return Ok(());
        }
        for entry in &entries {
            let when = entry
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{}  {}  [{}]  {:?}",
                when,
                entry.request_id,
                entry.priority.clone().with(priority_color(&entry.priority)),
                entry.status,
            );
            if !entry.symptoms.is_empty() {
                println!("    Symptoms: {}", entry.symptoms.join(", "));
            }
            if let Some(recommendation) = &entry.recommendation {
                println!("    {}", recommendation);
            }
        }
        Ok(())
    }

    async fn show_clinics(&self, session: &Session) -> Result<(), DomainError> {
        let clinics = self.backend.nearby_clinics(&session.identity.token).await?;
        if clinics.is_empty() {
            println!("No clinics found nearby.");
            return Ok(());
        }
        for clinic in &clinics {
            println!("{} - {}", clinic.name.clone().bold(), clinic.address);
        }
        Ok(())
    }

    async fn provider_dashboard(&self, session: &Session) -> Result<(), DomainError> {
        let queue_service = QueueService::new(Arc::clone(&self.backend));
        loop {
            match queue_service.completed_queue(&session.identity.token).await {
                Ok(queue) => render_queue(&queue),
                Err(e) => {
                    error!(error = %e, "queue fetch failed");
                    alert(&e.to_string());
                }
            }

            let choice = Select::new("Provider portal:", vec!["Refresh queue", "Sign out"])
                .prompt()
                .map_err(prompt_err)?;
            if choice == "Sign out" {
                return Ok(());
            }
        }
    }
}

fn render_queue(queue: &[TriageRequest]) {
    println!("{}", "Patient Queue".bold());
    if queue.is_empty() {
        println!("No patients in queue");
        return;
    }
    // Entries keep the backend's order.
    for entry in queue {
        println!(
            "Patient {}  [{}]",
            mask_patient_id(&entry.patient_id).bold(),
            entry
                .priority
                .clone()
                .to_uppercase()
                .with(priority_color(&entry.priority)),
        );
        if !entry.symptoms.is_empty() {
            println!("  Symptoms: {}", entry.symptoms.join(", "));
        }
        if !entry.severity.is_empty() {
            println!(
                "  Severity: {}",
                entry.severity.clone().with(severity_color(&entry.severity))
            );
        }
        if !entry.visual_signs.is_empty() {
            println!("  Visual signs: {}", entry.visual_signs);
        }
        if !entry.summary.is_empty() {
            println!("  {}", entry.summary);
        }
        println!();
    }
}

fn render_analysis(analysis: &AnalysisResult) {
    println!("{}", "AI Analysis Results".bold());

    if !analysis.transcription.is_empty() {
        println!("{}", "Transcription".bold());
        println!("  \"{}\"", analysis.transcription.clone().italic());
    }
    if !analysis.symptoms.is_empty() {
        println!("{}", "Detected Symptoms".bold());
        println!("  {}", analysis.symptoms.join(", "));
    }
    if !analysis.visual_signs.is_empty() {
        println!("{}", "Visual Signs".bold());
        println!("  {}", analysis.visual_signs);
    }
    if !analysis.severity.is_empty() {
        println!(
            "{} {}",
            "Severity:".bold(),
            analysis
                .severity
                .clone()
                .with(severity_color(&analysis.severity))
        );
    }
    if !analysis.recommendations.is_empty() {
        println!("{}", "Recommendations".bold());
        for recommendation in &analysis.recommendations {
            println!("  - {}", recommendation);
        }
    }
    if !analysis.citations.is_empty() {
        println!("{}", "Evidence-Based Sources".bold());
        for citation in &analysis.citations {
            println!("  [{}] {}", citation.source, citation.title);
            println!("      {}", citation.url.clone().underlined());
        }
    }
}

#[async_trait]
impl InputPort for TriageTui {
    async fn run(&self) -> Result<(), DomainError> {
        let mut gate = SessionService::new(Arc::clone(&self.auth));

        loop {
            let Some(session) = self.sign_in_prompt(&mut gate).await? else {
                return Ok(());
            };

            match session.role {
                Role::Patient => self.patient_dashboard(&session).await?,
                Role::Provider => self.provider_dashboard(&session).await?,
            }
            gate.sign_out();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_badge_colors_follow_the_four_level_scale() {
        assert_eq!(priority_color("critical"), Color::Red);
        assert_eq!(priority_color("high"), Color::DarkYellow);
        assert_eq!(priority_color("moderate"), Color::Yellow);
        assert_eq!(priority_color("low"), Color::Green);
        assert_eq!(priority_color("normal"), Color::Green);
    }

    #[test]
    fn severity_colors_cover_unknown() {
        assert_eq!(severity_color("Severe"), Color::Red);
        assert_eq!(severity_color("mild"), Color::Green);
        assert_eq!(severity_color("Unknown"), Color::White);
    }
}
