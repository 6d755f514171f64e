use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use minijinja::context;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::rca::dtos::{GenerateReportForm, SubmissionDto};
use crate::features::rca::models::UploadedFile;
use crate::features::rca::services::RcaService;
use crate::shared::constants::{
    content_type_for, FIELD_DATE, FIELD_DESCRIPTION, FIELD_FILES, FIELD_HEADING, FIELD_RCA_BY,
    FIELD_SITE_NAME, REQUIRED_FIELDS_MESSAGE,
};
use crate::shared::flash;
use crate::shared::templates::{render_template, INDEX_TEMPLATE};
use crate::shared::validation::header_safe;

/// State for RCA handlers
#[derive(Clone)]
pub struct RcaState {
    pub rca_service: Arc<RcaService>,
    /// Key for signing flash cookies
    pub secret_key: Arc<str>,
    /// Fixed external base URL; derived per request when `None`
    pub public_base_url: Option<Arc<str>>,
}

/// Base URL as seen by the client, from `Host` and `X-Forwarded-Proto`
fn request_base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    format!("{}://{}", scheme, host)
}

async fn read_text(field: Field<'_>) -> Result<String> {
    let name = field.name().unwrap_or("").to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field '{}': {}", name, e)))
}

/// Collect form fields and uploads. Uploads stay in memory.
async fn read_submission(multipart: &mut Multipart) -> Result<(SubmissionDto, Vec<UploadedFile>)> {
    let mut dto = SubmissionDto::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            FIELD_FILES => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                files.push(UploadedFile {
                    filename,
                    bytes: data.to_vec(),
                });
            }
            FIELD_SITE_NAME => dto.site_name = read_text(field).await?,
            FIELD_DATE => dto.date = read_text(field).await?,
            FIELD_HEADING => dto.heading = read_text(field).await?,
            FIELD_DESCRIPTION => dto.description = read_text(field).await?,
            FIELD_RCA_BY => dto.rca_by = read_text(field).await?,
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    Ok((dto, files))
}

/// Submission form
#[utoipa::path(
    get,
    path = "/",
    tag = "rca",
    responses(
        (status = 200, description = "HTML submission form, with any pending flash message")
    )
)]
pub async fn index(State(state): State<RcaState>, headers: HeaderMap) -> Result<Response> {
    let message = flash::take_from_headers(&headers, &state.secret_key);
    let html = render_template(INDEX_TEMPLATE, context! { flash => message.as_deref() })?;

    if message.is_some() {
        Ok(([(header::SET_COOKIE, flash::clear_cookie())], Html(html)).into_response())
    } else {
        Ok(Html(html).into_response())
    }
}

/// Serve a stored attachment inline
#[utoipa::path(
    get,
    path = "/uploads/{name}",
    tag = "rca",
    params(
        ("name" = String, Path, description = "Stored attachment name")
    ),
    responses(
        (status = 200, description = "Attachment content, served inline"),
        (status = 404, description = "Unknown attachment")
    )
)]
pub async fn uploaded_file(
    State(state): State<RcaState>,
    Path(name): Path<String>,
) -> Result<Response> {
    let bytes = state
        .rca_service
        .open_attachment(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Attachment '{}' not found", name)))?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes).into_response())
}

/// Generate an RCA report
///
/// Stores the attachments, files a GitHub issue when configured and returns
/// the PDF as a download. Missing required fields redirect back to the form
/// with a flash message and nothing is stored or filed.
#[utoipa::path(
    post,
    path = "/generate",
    tag = "rca",
    request_body(
        content = GenerateReportForm,
        content_type = "multipart/form-data",
        description = "RCA form fields and repeated `files` attachments",
    ),
    responses(
        (status = 200, description = "Generated report as an application/pdf download"),
        (status = 303, description = "Required field missing; redirect to the form"),
        (status = 400, description = "Malformed multipart body"),
        (status = 500, description = "Attachment could not be stored")
    )
)]
pub async fn generate(
    State(state): State<RcaState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response> {
    let (submission, files) = read_submission(&mut multipart).await?;
    let submission = submission.trimmed();

    if let Err(e) = submission.validate() {
        debug!("Rejected RCA submission: {}", e);
        let cookie = flash::set_cookie(&state.secret_key, REQUIRED_FIELDS_MESSAGE)?;
        return Ok((
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, "/".to_string()),
                (header::SET_COOKIE, cookie),
            ],
        )
            .into_response());
    }

    let base_url = match &state.public_base_url {
        Some(base) => base.to_string(),
        None => request_base_url(&headers),
    };

    let report = state
        .rca_service
        .generate(submission, files, &base_url)
        .await?;
    debug!("Issue link for {}: {}", report.filename, report.ticket);

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        header_safe(&report.filename)
    ))
    .map_err(|e| AppError::Internal(format!("Invalid Content-Disposition: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response())
}
