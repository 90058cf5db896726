//! Application use cases: session gate, upload flow, poll task, queue view.

pub mod poll_task;
pub mod queue_service;
pub mod session_service;
pub mod upload_flow;

pub use poll_task::{PollOutcome, PollTask};
pub use queue_service::{QueueService, mask_patient_id};
pub use session_service::SessionService;
pub use upload_flow::{FlowState, ProgressGauge, UploadFlow};
