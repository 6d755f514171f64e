use std::fmt;

/// Outcome of filing the tracking issue for a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketResult {
    /// Issue created; browser URL of the new issue
    Created { url: String },
    /// Tracker answered with a status other than 200/201
    Failed { status: u16 },
    /// Tracker could not be reached or sent an unusable body
    Unreachable { reason: String },
    /// Token or repository not configured
    NotConfigured,
}

impl fmt::Display for TicketResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketResult::Created { url } => write!(f, "{}", url),
            TicketResult::Failed { status } => {
                write!(f, "GitHub issue creation failed ({}).", status)
            }
            TicketResult::Unreachable { reason } => {
                write!(f, "GitHub issue creation failed ({}).", reason)
            }
            TicketResult::NotConfigured => write!(f, "GitHub token or repo not configured."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strings() {
        assert_eq!(
            TicketResult::Created {
                url: "https://github.com/acme/rca/issues/7".to_string()
            }
            .to_string(),
            "https://github.com/acme/rca/issues/7"
        );
        assert_eq!(
            TicketResult::Failed { status: 422 }.to_string(),
            "GitHub issue creation failed (422)."
        );
        assert_eq!(
            TicketResult::Unreachable {
                reason: "request failed: connection refused".to_string()
            }
            .to_string(),
            "GitHub issue creation failed (request failed: connection refused)."
        );
        assert_eq!(
            TicketResult::NotConfigured.to_string(),
            "GitHub token or repo not configured."
        );
    }
}
