/// Extensions accepted for upload (compared lowercase)
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    // images
    "png",
    "jpg",
    "jpeg",
    "gif",
    "bmp",
    // videos
    "mp4",
    "mov",
    "webm",
    "mkv",
    "avi",
    // others
    "pdf",
    "txt",
    "log",
    "zip",
];

/// Extensions embedded into the report as pictures
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Multipart field names of the submission form
pub const FIELD_SITE_NAME: &str = "site_name";
pub const FIELD_DATE: &str = "date";
pub const FIELD_HEADING: &str = "heading";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_RCA_BY: &str = "rca_by";
pub const FIELD_FILES: &str = "files";

/// Flash message shown when a required field is missing
pub const REQUIRED_FIELDS_MESSAGE: &str = "Site name, date, and heading are required.";

/// Cookie carrying the signed flash message between redirect and render
pub const FLASH_COOKIE_NAME: &str = "rca_flash";

/// Lowercase extension of a file name, if it has one
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether the file name carries an extension from the upload allow-list
pub fn is_allowed_file(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether the file name carries a picture extension
pub fn is_image_file(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Content type served for a stored attachment
pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("pdf") => "application/pdf",
        Some("txt") | Some("log") => "text/plain; charset=utf-8",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_allowed_file() {
        assert!(is_allowed_file("photo.jpg"));
        assert!(is_allowed_file("PHOTO.JPG"));
        assert!(is_allowed_file("archive.tar.zip"));
        assert!(is_allowed_file("trace.log"));
        assert!(!is_allowed_file("README"));
        assert!(!is_allowed_file("script.sh"));
        assert!(!is_allowed_file("photo.jpg.exe"));
        assert!(!is_allowed_file(""));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file("a.png"));
        assert!(is_image_file("a.Jpeg"));
        assert!(is_image_file("a.bmp"));
        assert!(!is_image_file("a.mp4"));
        assert!(!is_image_file("a.txt"));
        assert!(!is_image_file("png"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("x.JPG"), "image/jpeg");
        assert_eq!(content_type_for("x.mov"), "video/quicktime");
        assert_eq!(content_type_for("x.bin"), "application/octet-stream");
    }
}
