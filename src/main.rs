//! Wiring & DI. Entry point: bootstrap adapters, inject into the TUI, run.
//! No business logic here; backend selection is the only decision made.

use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use triage_client::adapters::demo::{DemoBackend, DemoIdentity, DemoStorage};
use triage_client::adapters::http::{HttpTriageBackend, ObjectStorageAdapter, RestIdentityAdapter};
use triage_client::adapters::ui::tui::TriageTui;
use triage_client::ports::{AuthPort, InputPort, StoragePort, TriageBackend};
use triage_client::shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found (check CWD)"),
    }

    triage_client::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_default();
    let poll_interval = Duration::from_secs(cfg.poll_interval_secs_or_default());

    // --- Backend selection: real adapters when configured, demo stubs otherwise ---
    let (auth, storage, backend): (
        Arc<dyn AuthPort>,
        Arc<dyn StoragePort>,
        Arc<dyn TriageBackend>,
    ) = if cfg.is_demo() {
        if cfg.demo != Some(true) {
            warn!("backend not configured, falling back to demo mode (set TRIAGE_API_BASE_URL, TRIAGE_IDENTITY_API_KEY, TRIAGE_STORAGE_BUCKET)");
        } else {
            info!("demo mode forced via TRIAGE_DEMO");
        }
        let delay = Duration::from_millis(cfg.demo_delay_ms_or_default());
        (
            Arc::new(DemoIdentity::new(delay)),
            Arc::new(DemoStorage::new(delay)),
            Arc::new(DemoBackend::new(delay * 4)),
        )
    } else {
        let api_base_url = cfg.api_base_url.clone().unwrap_or_default();
        let bucket = cfg.storage_bucket.clone().unwrap_or_default();
        let api_key = cfg.identity_api_key.clone().unwrap_or_default();
        info!(api = %api_base_url, bucket = %bucket, "using configured backend");
        (
            Arc::new(RestIdentityAdapter::new(
                cfg.identity_url_or_default(),
                api_key,
            )),
            Arc::new(ObjectStorageAdapter::new(
                cfg.storage_url_or_default(),
                bucket,
                cfg.upload_chunk_bytes(),
            )),
            Arc::new(HttpTriageBackend::new(api_base_url)),
        )
    };

    let tui = TriageTui::new(auth, storage, backend, poll_interval);
    tui.run().await?;

    info!("goodbye");
    Ok(())
}
