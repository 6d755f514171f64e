use utoipa::ToSchema;
use validator::Validate;

/// Form fields of one RCA submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct SubmissionDto {
    #[validate(length(min = 1, message = "Site name is required"))]
    pub site_name: String,

    /// Free text, not parsed
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,

    #[validate(length(min = 1, message = "Heading is required"))]
    pub heading: String,

    pub description: String,

    pub rca_by: String,
}

impl SubmissionDto {
    /// Copy with surrounding whitespace removed from every field
    pub fn trimmed(self) -> Self {
        Self {
            site_name: self.site_name.trim().to_string(),
            date: self.date.trim().to_string(),
            heading: self.heading.trim().to_string(),
            description: self.description.trim().to_string(),
            rca_by: self.rca_by.trim().to_string(),
        }
    }
}

/// Multipart body of `POST /generate`
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct GenerateReportForm {
    #[schema(example = "Plant A")]
    pub site_name: String,
    #[schema(example = "2024-01-01")]
    pub date: String,
    #[schema(example = "Conveyor Jam")]
    pub heading: String,
    #[schema(example = "Belt stopped at 10am")]
    pub description: Option<String>,
    #[schema(example = "J. Doe")]
    pub rca_by: Option<String>,
    /// Attachment; repeat the field for several files
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::sample_submission;

    #[test]
    fn test_complete_submission_is_valid() {
        assert!(sample_submission().trimmed().validate().is_ok());
    }

    #[test]
    fn test_whitespace_only_required_field_is_invalid() {
        let mut dto = sample_submission();
        dto.heading = "   ".to_string();

        let errors = dto.trimmed().validate().unwrap_err();

        assert!(errors.field_errors().contains_key("heading"));
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let mut dto = sample_submission();
        dto.description = String::new();
        dto.rca_by = " ".to_string();

        assert!(dto.trimmed().validate().is_ok());
    }

    #[test]
    fn test_trimmed_strips_every_field() {
        let dto = SubmissionDto {
            site_name: "  Plant A ".to_string(),
            date: "\t2024-01-01\n".to_string(),
            heading: " Conveyor Jam".to_string(),
            description: "\nBelt stopped at 10am\n".to_string(),
            rca_by: "J. Doe  ".to_string(),
        }
        .trimmed();

        assert_eq!(dto, sample_submission());
    }
}
