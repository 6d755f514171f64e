mod issue_service;
mod rca_service;

pub use issue_service::IssueService;
pub use rca_service::{report_filename, GeneratedReport, RcaService};
