//! Draws a [`ReportPlan`] into a PDF document with `printpdf`.

use image::DynamicImage;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Pt,
};

use super::layout::{DrawOp, ReportPlan, PAGE_HEIGHT, PAGE_WIDTH};
use super::metrics::Font;
use super::ComposeError;

const LAYER_NAME: &str = "Layer 1";

/// Pixels map 1:1 to points at this resolution
const IMAGE_DPI: f32 = 72.0;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ComposeError> {
        let load = |font| {
            doc.add_builtin_font(font)
                .map_err(|e| ComposeError::Render(format!("Failed to load font: {:?}", e)))
        };

        Ok(Self {
            regular: load(BuiltinFont::Helvetica)?,
            bold: load(BuiltinFont::HelveticaBold)?,
            oblique: load(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Oblique => &self.oblique,
        }
    }
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn place_image(
    layer: &PdfLayerReference,
    source: &DynamicImage,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) {
    let scale_x = width / source.width().max(1) as f32;
    let scale_y = height / source.height().max(1) as f32;

    Image::from_dynamic_image(source).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm(x)),
            translate_y: Some(mm(y)),
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

/// Render `plan` to PDF bytes.
///
/// `images` is indexed like the attachments the plan was laid out from.
pub fn render(
    plan: &ReportPlan,
    title: &str,
    logo: Option<&DynamicImage>,
    images: &[Option<DynamicImage>],
) -> Result<Vec<u8>, ComposeError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER_NAME);
    let fonts = Fonts::load(&doc)?;

    for (index, page) in plan.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER_NAME);
            doc.get_page(page_index).get_layer(layer_index)
        };

        for op in &page.ops {
            match op {
                DrawOp::Logo {
                    x,
                    y,
                    width,
                    height,
                } => {
                    if let Some(logo) = logo {
                        place_image(&layer, logo, *x, *y, *width, *height);
                    }
                }
                DrawOp::Text {
                    text,
                    x,
                    y,
                    font,
                    size,
                } => {
                    layer.use_text(text.as_str(), *size, mm(*x), mm(*y), fonts.get(*font));
                }
                DrawOp::Image {
                    attachment,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let source = images
                        .get(*attachment)
                        .and_then(Option::as_ref)
                        .ok_or_else(|| {
                            ComposeError::Render(format!(
                                "No decoded image for attachment {}",
                                attachment
                            ))
                        })?;
                    place_image(&layer, source, *x, *y, *width, *height);
                }
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ComposeError::Render(format!("Failed to write PDF: {:?}", e)))
}
