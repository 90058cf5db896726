//! Application configuration. Backend selection, endpoints, intervals.

use serde::Deserialize;

/// Default interval between status polls, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Default upload chunk size in KiB.
pub const DEFAULT_UPLOAD_CHUNK_KB: usize = 256;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Backend API root. Read from TRIAGE_API_BASE_URL.
    pub api_base_url: Option<String>,

    /// Identity provider sign-in endpoint. Read from TRIAGE_IDENTITY_URL.
    #[serde(default)]
    pub identity_url: Option<String>,

    /// Identity provider project API key. Read from TRIAGE_IDENTITY_API_KEY.
    #[serde(default)]
    pub identity_api_key: Option<String>,

    /// Object storage API root. Read from TRIAGE_STORAGE_URL.
    #[serde(default)]
    pub storage_url: Option<String>,

    /// Storage bucket videos are uploaded into. Read from TRIAGE_STORAGE_BUCKET.
    #[serde(default)]
    pub storage_bucket: Option<String>,

    /// Force the fully mocked demo variant. Read from TRIAGE_DEMO.
    #[serde(default)]
    pub demo: Option<bool>,

    /// Seconds between status polls (default 3). Read from TRIAGE_POLL_INTERVAL_SECS.
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    /// Upload chunk size in KiB (default 256). Read from TRIAGE_UPLOAD_CHUNK_KB.
    #[serde(default)]
    pub upload_chunk_kb: Option<usize>,

    /// Simulated latency for demo adapters in ms. Read from TRIAGE_DEMO_DELAY_MS.
    #[serde(default)]
    pub demo_delay_ms: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("TRIAGE"));
        if let Ok(path) = std::env::var("TRIAGE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Seconds between status polls. Defaults to 3 if unset or invalid.
    pub fn poll_interval_secs_or_default(&self) -> u64 {
        self.poll_interval_secs
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
    }

    /// Upload chunk size in bytes.
    pub fn upload_chunk_bytes(&self) -> usize {
        self.upload_chunk_kb
            .filter(|&kb| kb > 0)
            .unwrap_or(DEFAULT_UPLOAD_CHUNK_KB)
            * 1024
    }

    /// Identity sign-in endpoint. Defaults to the Identity Toolkit password endpoint.
    pub fn identity_url_or_default(&self) -> String {
        self.identity_url.clone().unwrap_or_else(|| {
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword".to_string()
        })
    }

    /// Storage API root. Defaults to the hosted storage endpoint.
    pub fn storage_url_or_default(&self) -> String {
        self.storage_url
            .clone()
            .unwrap_or_else(|| "https://firebasestorage.googleapis.com/v0".to_string())
    }

    /// Simulated latency for the demo adapters (default 1500 ms).
    pub fn demo_delay_ms_or_default(&self) -> u64 {
        self.demo_delay_ms.unwrap_or(1500)
    }

    /// True when everything the real adapters need is present.
    pub fn is_backend_configured(&self) -> bool {
        self.api_base_url.is_some()
            && self.identity_api_key.is_some()
            && self.storage_bucket.is_some()
    }

    /// Demo variant runs when forced, or when the backend is not configured.
    pub fn is_demo(&self) -> bool {
        self.demo.unwrap_or(false) || !self.is_backend_configured()
    }
}
