//! HTTP adapters: identity provider, object storage, triage backend.

pub mod backend;
pub mod identity;
pub mod storage;

pub use backend::HttpTriageBackend;
pub use identity::RestIdentityAdapter;
pub use storage::ObjectStorageAdapter;
