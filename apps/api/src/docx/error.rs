use thiserror::Error;

/// Errors from reading, parsing, or writing a `.docx` package.
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("not a valid docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing package part: {0}")]
    MissingPart(String),

    #[error("malformed document xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed document: {0}")]
    Malformed(String),
}
