use tracing::{info, warn};

use crate::core::config::TrackerConfig;
use crate::core::error::Result;
use crate::features::rca::dtos::SubmissionDto;
use crate::features::rca::models::{StoredAttachment, TicketResult};
use crate::modules::tracker::{GitHubClient, NewIssue, TrackerError};

/// Issue title: `{site} - {date} - {heading}`
pub fn issue_title(submission: &SubmissionDto) -> String {
    format!(
        "{} - {} - {}",
        submission.site_name, submission.date, submission.heading
    )
}

/// Markdown issue body. Pictures are embedded, other files linked.
pub fn issue_body(submission: &SubmissionDto, attachments: &[StoredAttachment]) -> String {
    let mut blocks = vec![
        format!("**Site:** {}", submission.site_name),
        format!("**Date:** {}", submission.date),
        format!("**RCA Heading:** {}", submission.heading),
        format!("**RCA By:** {}", submission.rca_by),
        "\n**Description:**\n".to_string(),
        submission.description.clone(),
        "\n**Attachments:**\n".to_string(),
    ];

    blocks.extend(attachments.iter().map(|a| {
        if a.is_image {
            format!("![{}]({})", a.display_name, a.url)
        } else {
            format!("- [{}]({})", a.display_name, a.url)
        }
    }));

    blocks.join("\n\n")
}

/// Files one tracking issue per submission
pub struct IssueService {
    client: Option<GitHubClient>,
}

impl IssueService {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let client = GitHubClient::from_config(config)?;

        match &client {
            Some(client) => info!("GitHub issue reporting enabled for {}", client.repo()),
            None => info!("GitHub issue reporting disabled: token or repo not configured"),
        }

        Ok(Self { client })
    }

    /// File the issue. Never fails: every outcome maps to a `TicketResult`.
    pub async fn report(
        &self,
        submission: &SubmissionDto,
        attachments: &[StoredAttachment],
    ) -> TicketResult {
        let Some(client) = &self.client else {
            return TicketResult::NotConfigured;
        };

        let issue = NewIssue {
            title: issue_title(submission),
            body: issue_body(submission, attachments),
        };

        match client.create_issue(&issue).await {
            Ok(url) => {
                info!("GitHub issue created: {}", url);
                TicketResult::Created { url }
            }
            Err(TrackerError::Status(status)) => {
                warn!("GitHub issue creation failed with status {}", status);
                TicketResult::Failed { status }
            }
            Err(e) => {
                warn!("GitHub issue creation failed: {}", e);
                TicketResult::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{sample_attachments, sample_submission, tracker_config};

    #[test]
    fn test_issue_title() {
        assert_eq!(
            issue_title(&sample_submission()),
            "Plant A - 2024-01-01 - Conveyor Jam"
        );
    }

    #[test]
    fn test_issue_body_embeds_images_and_links_files() {
        let body = issue_body(&sample_submission(), &sample_attachments());

        assert_eq!(
            body,
            "**Site:** Plant A\n\n\
             **Date:** 2024-01-01\n\n\
             **RCA Heading:** Conveyor Jam\n\n\
             **RCA By:** J. Doe\n\n\
             \n**Description:**\n\n\n\
             Belt stopped at 10am\n\n\
             \n**Attachments:**\n\n\n\
             ![photo.jpg](http://localhost:5000/uploads/photo_20240101103015000042.jpg)\n\n\
             - [log.txt](http://localhost:5000/uploads/log_20240101103015000042.txt)"
        );
    }

    #[tokio::test]
    async fn test_report_without_credentials_is_not_configured() {
        let mut config = tracker_config("http://127.0.0.1:9");
        config.repo = None;
        let service = IssueService::new(&config).unwrap();

        let result = service
            .report(&sample_submission(), &sample_attachments())
            .await;

        assert_eq!(result, TicketResult::NotConfigured);
    }

    #[tokio::test]
    async fn test_report_created() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/acme/rca/issues")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"title": "Plant A - 2024-01-01 - Conveyor Jam"}"#.to_string(),
            ))
            .with_status(201)
            .with_body(r#"{"html_url": "https://github.com/acme/rca/issues/7"}"#)
            .create_async()
            .await;
        let service = IssueService::new(&tracker_config(&server.url())).unwrap();

        let result = service.report(&sample_submission(), &[]).await;

        assert_eq!(
            result,
            TicketResult::Created {
                url: "https://github.com/acme/rca/issues/7".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_report_failed_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/repos/acme/rca/issues")
            .with_status(401)
            .with_body(r#"{"message": "Bad credentials"}"#)
            .create_async()
            .await;
        let service = IssueService::new(&tracker_config(&server.url())).unwrap();

        let result = service.report(&sample_submission(), &[]).await;

        assert_eq!(result, TicketResult::Failed { status: 401 });
        assert_eq!(result.to_string(), "GitHub issue creation failed (401).");
    }

    #[tokio::test]
    async fn test_report_unreachable_tracker_is_downgraded() {
        // nothing listens on the discard port
        let service = IssueService::new(&tracker_config("http://127.0.0.1:9")).unwrap();

        let result = service.report(&sample_submission(), &[]).await;

        assert!(matches!(result, TicketResult::Unreachable { .. }));
        assert!(result
            .to_string()
            .starts_with("GitHub issue creation failed (request failed:"));
    }
}
