pub mod draft_service;
pub mod pricing_service;
pub mod sheets_transport;
pub mod submission_service;
pub mod transport_monitor;
pub mod whatsapp_service;

pub use submission_service::SubmissionService;
