use image::DynamicImage;
use tracing::{debug, info, warn};

use super::layout::{
    layout_report, AttachmentLayout, LayoutAttachment, PixelSize, ReportContent, ReportPlan,
};
use super::render::render;
use super::ComposeError;
use crate::core::config::ReportConfig;

const DOCUMENT_TITLE: &str = "RCA Report";

/// One attachment as the report sees it
#[derive(Debug, Clone)]
pub struct ReportAttachment {
    /// Display name
    pub name: String,
    pub url: String,
    /// Raw bytes for image attachments, `None` for everything else
    pub image: Option<Vec<u8>>,
}

/// Form data and attachment results a report is built from
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub site_name: String,
    pub date: String,
    pub heading: String,
    pub rca_by: String,
    pub description: String,
    pub attachments: Vec<ReportAttachment>,
    /// Display string of the tracker outcome
    pub issue_link: String,
}

#[derive(Debug)]
pub struct ComposedReport {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Laid-out report together with the pictures it references
pub struct PreparedReport {
    pub plan: ReportPlan,
    images: Vec<Option<DynamicImage>>,
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, String> {
    let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err("image has no pixels".to_string());
    }
    Ok(DynamicImage::ImageRgb8(decoded.to_rgb8()))
}

fn pixel_size(image: &DynamicImage) -> PixelSize {
    PixelSize {
        width: image.width(),
        height: image.height(),
    }
}

/// Builds RCA report PDFs
pub struct ReportComposer {
    logo: Option<DynamicImage>,
}

impl ReportComposer {
    /// Load the page logo. A missing or unreadable logo only disables it.
    pub fn new(config: &ReportConfig) -> Self {
        let logo = match std::fs::read(&config.logo_path) {
            Ok(bytes) => match decode(&bytes) {
                Ok(logo) => Some(logo),
                Err(e) => {
                    warn!(
                        "Logo at {} could not be decoded: {}",
                        config.logo_path.display(),
                        e
                    );
                    None
                }
            },
            Err(e) => {
                warn!(
                    "Logo at {} not readable, reports will have no logo: {}",
                    config.logo_path.display(),
                    e
                );
                None
            }
        };

        if logo.is_some() {
            info!("Report logo loaded from {}", config.logo_path.display());
        }

        Self { logo }
    }

    /// Decode attachments and lay the report out
    pub fn prepare(&self, input: &ReportInput) -> PreparedReport {
        let mut images = Vec::with_capacity(input.attachments.len());
        let mut attachments = Vec::with_capacity(input.attachments.len());

        for attachment in &input.attachments {
            let (kind, decoded) = match &attachment.image {
                Some(bytes) => match decode(bytes) {
                    Ok(image) => (AttachmentLayout::Image(pixel_size(&image)), Some(image)),
                    Err(e) => {
                        warn!("Could not embed {}: {}", attachment.name, e);
                        (AttachmentLayout::BrokenImage(e), None)
                    }
                },
                None => (AttachmentLayout::File, None),
            };

            images.push(decoded);
            attachments.push(LayoutAttachment {
                name: attachment.name.clone(),
                url: attachment.url.clone(),
                kind,
            });
        }

        let content = ReportContent {
            site_name: input.site_name.clone(),
            date: input.date.clone(),
            heading: input.heading.clone(),
            rca_by: input.rca_by.clone(),
            description: input.description.clone(),
            attachments,
            issue_link: input.issue_link.clone(),
            logo: self.logo.as_ref().map(pixel_size),
        };

        PreparedReport {
            plan: layout_report(&content),
            images,
        }
    }

    /// Lay out and render the report
    pub fn compose(&self, input: &ReportInput) -> Result<ComposedReport, ComposeError> {
        let prepared = self.prepare(input);
        let page_count = prepared.plan.pages.len();
        debug!("Report laid out on {} page(s)", page_count);

        let bytes = render(
            &prepared.plan,
            DOCUMENT_TITLE,
            self.logo.as_ref(),
            &prepared.images,
        )?;

        Ok(ComposedReport { bytes, page_count })
    }
}
