//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: UI/CLI drives the session gate and the dashboards.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive loop (sign in -> patient or provider dashboard) until exit.
    async fn run(&self) -> Result<(), DomainError>;
}
