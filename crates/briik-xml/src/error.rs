//! Codec error types.

use thiserror::Error;

/// Failures that abort an import or export as a whole.
///
/// ## When This Occurs
/// - The text is not well-formed XML (unclosed or mismatched tags, bad
///   entities)
/// - The `<BRIIKData>` root element is missing
///
/// Bad values inside a well-formed document are NOT errors: they fall back
/// to defaults and are logged.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Reader or writer failure (malformed markup, bad escape, I/O on the
    /// in-memory buffer).
    #[error("Malformed XML: {0}")]
    Malformed(#[from] quick_xml::Error),

    /// Malformed attribute list on an element.
    #[error("Malformed XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// The document ended while elements were still open.
    #[error("Unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    /// The text contains no element at all.
    #[error("Document is empty")]
    EmptyDocument,

    /// No `<BRIIKData>` root element.
    #[error("Not a BRIIKData document: root element <{found}> found")]
    MissingRoot { found: String },

    /// The writer produced bytes that are not UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Convenience type alias for Results with XmlError.
pub type XmlResult<T> = Result<T, XmlError>;
