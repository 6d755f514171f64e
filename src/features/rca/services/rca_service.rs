use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::features::rca::dtos::SubmissionDto;
use crate::features::rca::models::{StoredAttachment, TicketResult, UploadedFile};
use crate::features::rca::services::IssueService;
use crate::modules::pdf::{ReportAttachment, ReportComposer, ReportInput};
use crate::modules::storage::{attachment_url, AttachmentStore};
use crate::shared::constants::is_allowed_file;
use crate::shared::validation::secure_filename;

/// Finished report ready to be sent to the client
#[derive(Debug)]
pub struct GeneratedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub ticket: TicketResult,
}

/// Download name: `{sanitised site}_{date}_RCA.pdf`
pub fn report_filename(submission: &SubmissionDto) -> String {
    format!(
        "{}_{}_RCA.pdf",
        secure_filename(&submission.site_name),
        submission.date
    )
}

/// Drives one submission through storage, issue filing and composition
pub struct RcaService {
    store: Arc<dyn AttachmentStore>,
    issues: IssueService,
    composer: Arc<ReportComposer>,
}

impl RcaService {
    pub fn new(
        store: Arc<dyn AttachmentStore>,
        issues: IssueService,
        composer: Arc<ReportComposer>,
    ) -> Self {
        Self {
            store,
            issues,
            composer,
        }
    }

    /// Keep uploads with a name and an allowed extension
    pub fn accept(files: Vec<UploadedFile>) -> Vec<UploadedFile> {
        files
            .into_iter()
            .filter(|file| {
                let allowed = !file.filename.is_empty() && is_allowed_file(&file.filename);
                if !allowed {
                    info!("Skipping upload with unsupported name: {:?}", file.filename);
                }
                allowed
            })
            .collect()
    }

    /// Persist accepted uploads in upload order
    pub async fn store_attachments(
        &self,
        files: Vec<UploadedFile>,
        base_url: &str,
    ) -> Result<Vec<StoredAttachment>> {
        let mut stored = Vec::new();

        for file in Self::accept(files) {
            let stored_ref = self.store.store(&file.filename, &file.bytes).await?;
            let url = attachment_url(base_url, &stored_ref.stored_name);
            let attachment = StoredAttachment::new(stored_ref, url);

            info!(
                "Saved attachment {} to {}",
                attachment.original_name,
                self.store.path_of(&attachment.stored_name).display()
            );
            stored.push(attachment);
        }

        Ok(stored)
    }

    /// Bytes of a stored attachment, `None` when unknown
    pub async fn open_attachment(&self, stored_name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.store.open(stored_name).await?)
    }

    async fn report_input(
        &self,
        submission: &SubmissionDto,
        attachments: &[StoredAttachment],
        ticket: &TicketResult,
    ) -> Result<ReportInput> {
        let mut report_attachments = Vec::with_capacity(attachments.len());

        for attachment in attachments {
            let image = if attachment.is_image {
                // an unreadable picture still gets its notice in the report
                Some(
                    self.store
                        .open(&attachment.stored_name)
                        .await?
                        .unwrap_or_default(),
                )
            } else {
                None
            };

            report_attachments.push(ReportAttachment {
                name: attachment.display_name.clone(),
                url: attachment.url.clone(),
                image,
            });
        }

        Ok(ReportInput {
            site_name: submission.site_name.clone(),
            date: submission.date.clone(),
            heading: submission.heading.clone(),
            rca_by: submission.rca_by.clone(),
            description: submission.description.clone(),
            attachments: report_attachments,
            issue_link: ticket.to_string(),
        })
    }

    /// Store attachments, file the issue, then compose the PDF.
    ///
    /// `submission` must already be trimmed and validated.
    pub async fn generate(
        &self,
        submission: SubmissionDto,
        files: Vec<UploadedFile>,
        base_url: &str,
    ) -> Result<GeneratedReport> {
        let attachments = self.store_attachments(files, base_url).await?;
        debug!(
            "Stored {} attachment(s) for {}",
            attachments.len(),
            submission.site_name
        );

        let ticket = self.issues.report(&submission, &attachments).await;

        let input = self.report_input(&submission, &attachments, &ticket).await?;
        let composer = Arc::clone(&self.composer);
        let report = tokio::task::spawn_blocking(move || composer.compose(&input))
            .await
            .map_err(|e| AppError::Internal(format!("Report composition task failed: {}", e)))??;

        info!(
            "Generated RCA report for {} ({} page(s), {} bytes)",
            submission.site_name,
            report.page_count,
            report.bytes.len()
        );

        Ok(GeneratedReport {
            filename: report_filename(&submission),
            bytes: report.bytes,
            ticket,
        })
    }
}
