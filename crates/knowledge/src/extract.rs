//! Plain-text extraction and cleanup for uploaded documents.
//!
//! Binary formats are decoded elsewhere; this module only reads text files
//! and normalizes text into the shape the chunker expects.

use docqa_core::config::UploadSettings;
use docqa_core::{AppError, AppResult};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\w\s.,!?;:\-()\[\]{}"']+"#).expect("valid character filter pattern")
});
static ELLIPSIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{3,}").expect("valid ellipsis pattern"));

/// Extensions `extract_text` can read, lowercase with leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".txt", ".md"];

/// Whether `extract_text` can read this file.
pub fn is_extractable(path: &Path) -> bool {
    let extension = format!(".{}", extension_of(path));
    SUPPORTED_EXTENSIONS.contains(&extension.as_str())
}

/// Read a text document and return its cleaned contents.
///
/// Anything outside [`SUPPORTED_EXTENSIONS`], including `.pdf`, fails with
/// `InvalidArgument`.
pub fn extract_text(path: &Path) -> AppResult<String> {
    let extension = extension_of(path);

    match extension.as_str() {
        _ if is_extractable(path) => {
            let bytes = std::fs::read(path)?;
            let raw = String::from_utf8_lossy(&bytes);
            tracing::debug!("Read {} bytes from {:?}", bytes.len(), path);
            Ok(clean_text(&raw))
        }
        "pdf" => Err(AppError::InvalidArgument(format!(
            "PDF text extraction is not available; convert {:?} to text first",
            path
        ))),
        other => Err(AppError::InvalidArgument(format!(
            "Unsupported file type: '{}'",
            other
        ))),
    }
}

/// Normalize extracted text.
///
/// - whitespace runs collapse to a single space
/// - characters other than word characters, whitespace and common
///   punctuation are dropped
/// - runs of three or more periods become `...`
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let filtered = DISALLOWED.replace_all(&collapsed, "");
    let normalized = ELLIPSIS.replace_all(&filtered, "...");

    normalized.trim().to_string()
}

/// Check an uploaded file against the configured extension and size limits.
pub fn validate_upload(path: &Path, settings: &UploadSettings) -> AppResult<()> {
    let extension = format!(".{}", extension_of(path));
    if !settings
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        return Err(AppError::InvalidArgument(format!(
            "File type {} not allowed. Allowed types: {}",
            extension,
            settings.allowed_extensions.join(", ")
        )));
    }

    let size = std::fs::metadata(path)?.len();
    if size > settings.max_file_size {
        return Err(AppError::InvalidArgument(format!(
            "File size too large ({} bytes). Maximum size: {} bytes",
            size, settings.max_file_size
        )));
    }

    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        let cleaned = clean_text("  Hello \n\n\t world  ");
        assert_eq!(cleaned, "Hello world");
    }

    #[test]
    fn test_clean_text_strips_symbols_keeps_punctuation() {
        let cleaned = clean_text("Price: $5 (approx) ~ really? «yes»!");
        assert_eq!(cleaned, "Price: 5 (approx)  really? yes!");
    }

    #[test]
    fn test_clean_text_normalizes_ellipsis() {
        let cleaned = clean_text("Wait...... for it.");
        assert_eq!(cleaned, "Wait... for it.");
    }

    #[test]
    fn test_clean_text_keeps_unicode_letters() {
        let cleaned = clean_text("Acentuação: ã, õ, ç");
        assert_eq!(cleaned, "Acentuação: ã, õ, ç");
    }

    #[test]
    fn test_extract_txt() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "First line.\nSecond   line...\u{7} done").unwrap();

        let text = extract_text(file.path()).unwrap();
        assert_eq!(text, "First line. Second line... done");
    }

    #[test]
    fn test_extract_pdf_rejected() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let result = extract_text(file.path());
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_extract_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let result = extract_text(file.path());
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_upload_limits() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "{}", "x".repeat(64)).unwrap();

        let settings = UploadSettings::default();
        assert!(validate_upload(file.path(), &settings).is_ok());

        let tight = UploadSettings {
            max_file_size: 10,
            ..UploadSettings::default()
        };
        assert!(matches!(
            validate_upload(file.path(), &tight),
            Err(AppError::InvalidArgument(_))
        ));

        let md = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        assert!(validate_upload(md.path(), &settings).is_ok());

        let pdf = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        assert!(validate_upload(pdf.path(), &settings).is_err());
    }

    #[test]
    fn test_default_uploads_are_extractable() {
        for extension in &UploadSettings::default().allowed_extensions {
            assert!(
                SUPPORTED_EXTENSIONS.contains(&extension.as_str()),
                "{} is allowed but cannot be extracted",
                extension
            );
            assert!(is_extractable(Path::new(&format!("doc{}", extension.to_uppercase()))));
        }
        assert!(!is_extractable(Path::new("doc.pdf")));
        assert!(!is_extractable(Path::new("README")));
    }
}
