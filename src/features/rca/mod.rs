pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use handlers::RcaState;
pub use routes::routes;
pub use services::{IssueService, RcaService};
