use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Characters that survive filename sanitisation
    /// - Kept: ASCII letters, digits, "_", ".", "-"
    /// - Dropped: everything else (spaces are turned into "_" beforehand)
    pub static ref FILENAME_STRIP_REGEX: Regex = Regex::new(r"[^A-Za-z0-9_.\-]").unwrap();

    /// Characters that must not reach a Content-Disposition filename
    /// - Quotes, backslashes and control characters
    pub static ref HEADER_UNSAFE_REGEX: Regex = Regex::new(r#"["\\\p{Cc}]"#).unwrap();
}

/// Reduce a user supplied file name to a safe, flat ASCII name.
///
/// Path separators become spaces, whitespace runs become a single `_`,
/// anything outside `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_`
/// are trimmed. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    FILENAME_STRIP_REGEX
        .replace_all(&joined, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Whether `name` is already in sanitised form (used to guard stored-name lookups)
pub fn is_secure_filename(name: &str) -> bool {
    !name.is_empty() && secure_filename(name) == name
}

/// Make a value safe to embed in a quoted Content-Disposition filename
pub fn header_safe(value: &str) -> String {
    HEADER_UNSAFE_REGEX.replace_all(value, "_").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename_strips_traversal() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(secure_filename("/abs/path/log.txt"), "abs_path_log.txt");
    }

    #[test]
    fn test_secure_filename_normalises_whitespace_and_symbols() {
        assert_eq!(secure_filename("My cool  photo.jpg"), "My_cool_photo.jpg");
        assert_eq!(secure_filename("report (final)!.pdf"), "report_final.pdf");
        assert_eq!(secure_filename("  .hidden.txt "), "hidden.txt");
        assert_eq!(secure_filename("Plant A"), "Plant_A");
    }

    #[test]
    fn test_secure_filename_drops_non_ascii() {
        assert_eq!(secure_filename("café.png"), "caf.png");
        assert_eq!(secure_filename("日本.png"), "png");
        assert_eq!(secure_filename("日本"), "");
    }

    #[test]
    fn test_is_secure_filename() {
        assert!(is_secure_filename("photo_20240101000000000000.jpg"));
        assert!(!is_secure_filename("../photo.jpg"));
        assert!(!is_secure_filename("a b.jpg"));
        assert!(!is_secure_filename(""));
    }

    #[test]
    fn test_header_safe() {
        assert_eq!(header_safe("2024-01-01"), "2024-01-01");
        assert_eq!(header_safe("2024\"01\\01\r\n"), "2024_01_01__");
    }
}
