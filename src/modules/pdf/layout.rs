//! Page layout for RCA reports.
//!
//! Layout is a pure pass from report content to a [`ReportPlan`]: pages of
//! positioned draw operations. Every section step takes the current
//! [`LayoutCursor`] and returns the advanced one; page breaks are decided
//! from remaining space and content size only. Coordinates are PDF points
//! with the origin at the bottom-left corner of an A4 page.

use super::metrics::{printable, text_width, Font};

pub const PAGE_WIDTH: f32 = 595.275_6;
pub const PAGE_HEIGHT: f32 = 841.889_8;
pub const MARGIN: f32 = 50.0;
pub const PRINTABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Logo box: 1.7in x 0.8in, bottom-left corner at (40, H - 80)
pub const LOGO_X: f32 = 40.0;
pub const LOGO_Y: f32 = PAGE_HEIGHT - 80.0;
pub const LOGO_BOX_WIDTH: f32 = 122.4;
pub const LOGO_BOX_HEIGHT: f32 = 57.6;

/// Space below the top margin reserved for the logo on the first page
const FIRST_PAGE_HEADER: f32 = 90.0;
/// Same, for every page started by a page break
const CONTINUATION_HEADER: f32 = 80.0;

/// Tallest an embedded picture may be drawn (3.5in)
pub const IMAGE_MAX_HEIGHT: f32 = 252.0;

/// Space that must remain above the bottom margin before each section
const SECTION_RESERVE: f32 = 80.0;
const IMAGE_RESERVE: f32 = 80.0;
const ISSUE_LINK_RESERVE: f32 = 60.0;

const TITLE_TEXT: &str = "RCA Report";
const TITLE_SIZE: f32 = 16.0;
const TITLE_ADVANCE: f32 = 30.0;

const META_SIZE: f32 = 10.0;
const META_VALUE_OFFSET: f32 = 120.0;
const META_ADVANCE: f32 = 18.0;
const META_TRAILING_GAP: f32 = 10.0;

const LABEL_SIZE: f32 = 10.0;
const LABEL_ADVANCE: f32 = 14.0;

const BODY_SIZE: f32 = 10.0;
const BODY_LEADING: f32 = 12.0;
const DESCRIPTION_TRAILING_GAP: f32 = 20.0;

const IMAGE_GAP: f32 = 12.0;
const NOTICE_SIZE: f32 = 9.0;

const LIST_SIZE: f32 = 9.0;
const LIST_LEADING: f32 = 12.0;
const LIST_ENTRY_GAP: f32 = 6.0;

const ISSUE_VALUE_DROP: f32 = 14.0;

/// Pixel dimensions of a decoded raster image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// What layout knows about an attachment
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentLayout {
    /// Decoded picture, embedded in the body
    Image(PixelSize),
    /// Picture that could not be decoded; a notice is drawn instead
    BrokenImage(String),
    /// Any other file, listed by name and URL
    File,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutAttachment {
    pub name: String,
    pub url: String,
    pub kind: AttachmentLayout,
}

/// Everything the layout pass needs
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContent {
    pub site_name: String,
    pub date: String,
    pub heading: String,
    pub rca_by: String,
    pub description: String,
    pub attachments: Vec<LayoutAttachment>,
    pub issue_link: String,
    pub logo: Option<PixelSize>,
}

impl ReportContent {
    /// Copy with every string restricted to what the built-in fonts can draw
    fn printable(&self) -> ReportContent {
        let attachments = self
            .attachments
            .iter()
            .map(|attachment| LayoutAttachment {
                name: printable(&attachment.name),
                url: printable(&attachment.url),
                kind: match &attachment.kind {
                    AttachmentLayout::BrokenImage(error) => {
                        AttachmentLayout::BrokenImage(printable(error))
                    }
                    kind => kind.clone(),
                },
            })
            .collect();

        ReportContent {
            site_name: printable(&self.site_name),
            date: printable(&self.date),
            heading: printable(&self.heading),
            rca_by: printable(&self.rca_by),
            description: printable(&self.description),
            attachments,
            issue_link: printable(&self.issue_link),
            logo: self.logo,
        }
    }
}

/// A positioned drawing operation. `y` is the text baseline, or the bottom
/// edge for pictures.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Logo {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        font: Font,
        size: f32,
    },
    Image {
        /// Index into `ReportContent::attachments`
        attachment: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePlan {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPlan {
    pub pages: Vec<PagePlan>,
}

#[cfg(test)]
impl ReportPlan {
    /// All text runs in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| &p.ops).filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Position on the page currently being filled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page: usize,
    pub y: f32,
}

/// Whether content reaching down to `bottom` leaves `reserve` above the margin
pub fn fits(bottom: f32, reserve: f32) -> bool {
    bottom >= MARGIN + reserve
}

/// Scale that fits a picture into the printable width and the height cap,
/// never enlarging it
pub fn image_scale(size: PixelSize) -> f32 {
    let width = size.width.max(1) as f32;
    let height = size.height.max(1) as f32;
    (PRINTABLE_WIDTH / width)
        .min(IMAGE_MAX_HEIGHT / height)
        .min(1.0)
}

/// Logo box placement, preserving aspect ratio and centred in the box
pub fn logo_placement(size: PixelSize) -> DrawOp {
    let width = size.width.max(1) as f32;
    let height = size.height.max(1) as f32;
    let scale = (LOGO_BOX_WIDTH / width).min(LOGO_BOX_HEIGHT / height);
    let (w, h) = (width * scale, height * scale);

    DrawOp::Logo {
        x: LOGO_X + (LOGO_BOX_WIDTH - w) / 2.0,
        y: LOGO_Y + (LOGO_BOX_HEIGHT - h) / 2.0,
        width: w,
        height: h,
    }
}

/// Split `text` into paragraphs on any line break convention
pub fn paragraphs(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Greedy single-pass word wrap.
///
/// Words are separated by single spaces. A word that alone exceeds
/// `max_width` is broken at character boundaries.
pub fn wrap_paragraph(paragraph: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in paragraph.split(' ') {
        let candidate = format!("{} {}", line, word).trim().to_string();
        if text_width(&candidate, font, size) <= max_width {
            line = candidate;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        line = word.trim().to_string();

        while text_width(&line, font, size) > max_width {
            let cut = longest_fitting_prefix(&line, font, size, max_width);
            if cut >= line.len() {
                break;
            }
            lines.push(line[..cut].to_string());
            line = line[cut..].to_string();
        }
    }

    lines.push(line);
    lines
}

/// Byte length of the longest prefix of `text` that fits (at least one char)
fn longest_fitting_prefix(text: &str, font: Font, size: f32, max_width: f32) -> usize {
    let mut end = 0;
    for (idx, c) in text.char_indices() {
        let next = idx + c.len_utf8();
        if end > 0 && text_width(&text[..next], font, size) > max_width {
            break;
        }
        end = next;
    }
    end
}

/// Accumulates draw operations page by page
struct PlanBuilder {
    plan: ReportPlan,
    logo: Option<PixelSize>,
}

impl PlanBuilder {
    fn new(logo: Option<PixelSize>) -> Self {
        Self {
            plan: ReportPlan::default(),
            logo,
        }
    }

    fn start_page(&mut self, header: f32) -> LayoutCursor {
        let mut page = PagePlan::default();
        if let Some(size) = self.logo {
            page.ops.push(logo_placement(size));
        }
        self.plan.pages.push(page);

        LayoutCursor {
            page: self.plan.pages.len() - 1,
            y: PAGE_HEIGHT - MARGIN - header,
        }
    }

    fn first_page(&mut self) -> LayoutCursor {
        self.start_page(FIRST_PAGE_HEADER)
    }

    fn page_break(&mut self) -> LayoutCursor {
        self.start_page(CONTINUATION_HEADER)
    }

    /// Continue on the current page when `bottom` keeps `reserve`, else break
    fn ensure(&mut self, cursor: LayoutCursor, bottom: f32, reserve: f32) -> LayoutCursor {
        if fits(bottom, reserve) {
            cursor
        } else {
            self.page_break()
        }
    }

    fn push(&mut self, cursor: LayoutCursor, op: DrawOp) {
        self.plan.pages[cursor.page].ops.push(op);
    }

    fn text(&mut self, cursor: LayoutCursor, x: f32, text: &str, font: Font, size: f32) {
        self.push(
            cursor,
            DrawOp::Text {
                text: text.to_string(),
                x,
                y: cursor.y,
                font,
                size,
            },
        );
    }

    /// Lines at a fixed leading, breaking the page whenever a baseline would
    /// fall below the bottom margin. Empty lines advance without drawing.
    fn lines(
        &mut self,
        mut cursor: LayoutCursor,
        lines: &[String],
        font: Font,
        size: f32,
        leading: f32,
    ) -> LayoutCursor {
        for line in lines {
            cursor = self.ensure(cursor, cursor.y, 0.0);
            if !line.is_empty() {
                self.text(cursor, MARGIN, line, font, size);
            }
            cursor.y -= leading;
        }
        cursor
    }

    fn title(&mut self, mut cursor: LayoutCursor) -> LayoutCursor {
        self.text(cursor, MARGIN, TITLE_TEXT, Font::Bold, TITLE_SIZE);
        cursor.y -= TITLE_ADVANCE;
        cursor
    }

    fn metadata(&mut self, mut cursor: LayoutCursor, content: &ReportContent) -> LayoutCursor {
        let rows = [
            ("Site Name:", &content.site_name),
            ("Date:", &content.date),
            ("Heading:", &content.heading),
            ("RCA By:", &content.rca_by),
        ];

        for (label, value) in rows {
            self.text(cursor, MARGIN, label, Font::Bold, META_SIZE);

            let lines = wrap_paragraph(
                value,
                Font::Regular,
                META_SIZE,
                PRINTABLE_WIDTH - META_VALUE_OFFSET,
            );
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    cursor.y -= BODY_LEADING;
                    cursor = self.ensure(cursor, cursor.y, 0.0);
                }
                if !line.is_empty() {
                    self.text(
                        cursor,
                        MARGIN + META_VALUE_OFFSET,
                        line,
                        Font::Regular,
                        META_SIZE,
                    );
                }
            }
            cursor.y -= META_ADVANCE;
        }

        cursor.y -= META_TRAILING_GAP;
        cursor
    }

    fn description(&mut self, mut cursor: LayoutCursor, description: &str) -> LayoutCursor {
        self.text(cursor, MARGIN, "Description:", Font::Bold, LABEL_SIZE);
        cursor.y -= LABEL_ADVANCE;

        let mut body = Vec::new();
        for paragraph in paragraphs(description) {
            body.extend(wrap_paragraph(
                &paragraph,
                Font::Regular,
                BODY_SIZE,
                PRINTABLE_WIDTH,
            ));
            body.push(String::new());
        }

        let mut cursor = self.lines(cursor, &body, Font::Regular, BODY_SIZE, BODY_LEADING);
        cursor.y -= DESCRIPTION_TRAILING_GAP;
        cursor
    }

    fn images(
        &mut self,
        mut cursor: LayoutCursor,
        attachments: &[LayoutAttachment],
    ) -> LayoutCursor {
        for (index, attachment) in attachments.iter().enumerate() {
            match &attachment.kind {
                AttachmentLayout::Image(size) => {
                    let scale = image_scale(*size);
                    let width = size.width as f32 * scale;
                    let height = size.height as f32 * scale;

                    cursor = self.ensure(cursor, cursor.y - height, IMAGE_RESERVE);
                    self.push(
                        cursor,
                        DrawOp::Image {
                            attachment: index,
                            x: MARGIN,
                            y: cursor.y - height,
                            width,
                            height,
                        },
                    );
                    cursor.y -= height + IMAGE_GAP;
                }
                AttachmentLayout::BrokenImage(reason) => {
                    let notice = format!("(Error embedding {}: {})", attachment.name, reason);
                    let lines =
                        wrap_paragraph(&notice, Font::Oblique, NOTICE_SIZE, PRINTABLE_WIDTH);
                    cursor = self.lines(cursor, &lines, Font::Oblique, NOTICE_SIZE, IMAGE_GAP);
                }
                AttachmentLayout::File => {}
            }
        }
        cursor
    }

    fn attachment_list(
        &mut self,
        mut cursor: LayoutCursor,
        attachments: &[LayoutAttachment],
    ) -> LayoutCursor {
        let files: Vec<&LayoutAttachment> = attachments
            .iter()
            .filter(|a| a.kind == AttachmentLayout::File)
            .collect();
        if files.is_empty() {
            return cursor;
        }

        cursor = self.ensure(cursor, cursor.y, SECTION_RESERVE);
        self.text(cursor, MARGIN, "Attachments:", Font::Bold, LABEL_SIZE);
        cursor.y -= LABEL_ADVANCE;

        for file in files {
            let mut entry = wrap_paragraph(
                &format!("- {}", file.name),
                Font::Regular,
                LIST_SIZE,
                PRINTABLE_WIDTH,
            );
            entry.extend(wrap_paragraph(&file.url, Font::Regular, LIST_SIZE, PRINTABLE_WIDTH));

            // keep an entry's lines together on one page
            let last_baseline = cursor.y - (entry.len() - 1) as f32 * LIST_LEADING;
            cursor = self.ensure(cursor, last_baseline, 0.0);

            cursor = self.lines(cursor, &entry, Font::Regular, LIST_SIZE, LIST_LEADING);
            cursor.y -= LIST_ENTRY_GAP;
        }
        cursor
    }

    fn issue_link(&mut self, mut cursor: LayoutCursor, issue_link: &str) -> LayoutCursor {
        cursor = self.ensure(cursor, cursor.y, ISSUE_LINK_RESERVE);
        self.text(cursor, MARGIN, "GitHub Issue Link:", Font::Bold, LABEL_SIZE);

        let value = wrap_paragraph(issue_link, Font::Regular, LIST_SIZE, PRINTABLE_WIDTH);
        let value_cursor = LayoutCursor {
            page: cursor.page,
            y: cursor.y - ISSUE_VALUE_DROP,
        };
        self.lines(value_cursor, &value, Font::Regular, LIST_SIZE, LIST_LEADING)
    }

    fn finish(self) -> ReportPlan {
        self.plan
    }
}

/// Lay out a complete report
pub fn layout_report(content: &ReportContent) -> ReportPlan {
    let content = &content.printable();
    let mut builder = PlanBuilder::new(content.logo);

    let cursor = builder.first_page();
    let cursor = builder.title(cursor);
    let cursor = builder.metadata(cursor, content);
    let cursor = builder.description(cursor, &content.description);
    let cursor = builder.images(cursor, &content.attachments);
    let cursor = builder.attachment_list(cursor, &content.attachments);
    builder.issue_link(cursor, &content.issue_link);

    builder.finish()
}
