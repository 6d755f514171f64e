//! Report composer
//!
//! Builds the paginated A4 RCA report. Layout is computed first as a plan of
//! positioned draw operations and then rendered with `printpdf`.

mod composer;
mod layout;
mod metrics;
mod render;

use thiserror::Error;

use crate::core::error::AppError;

pub use composer::{ComposedReport, ReportAttachment, ReportComposer, ReportInput};
#[cfg(test)]
pub use layout::DrawOp;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

impl From<ComposeError> for AppError {
    fn from(e: ComposeError) -> Self {
        AppError::Internal(e.to_string())
    }
}
