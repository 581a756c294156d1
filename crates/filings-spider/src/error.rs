use std::path::PathBuf;

/// Failures a stage needs to tell apart; anything else travels as [`anyhow::Error`].
#[derive(Debug, thiserror::Error)]
pub enum SpiderError {
    /// A required input directory (or record collection) is absent; fatal for that entity only.
    #[error("not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("invalid record collection for {entity}: {reason}")]
    InvalidListing { entity: String, reason: String },

    #[error(
        "converter rejected {file}: status {status}, content type \"{content_type}\", {len} bytes"
    )]
    ConversionRejected {
        file: String,
        status: u16,
        content_type: String,
        len: usize,
    },

    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("spreadsheet archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("spreadsheet xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("spreadsheet xml attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
