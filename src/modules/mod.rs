//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the attachment store, the issue tracker client and the PDF
//! report composer.

pub mod pdf;
pub mod storage;
pub mod tracker;
