use std::{io, result};

use quick_xml::events::attributes::AttrError;
use zip::result::ZipError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error {0}")]
    IO(#[from] io::Error),

    #[error("Zip error {0}")]
    Zip(#[from] ZipError),

    #[error("Fb2 file size couldn't be converted")]
    Fb2FileSizeConversion,

    #[error("Xml error {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Xml attribute error {0}")]
    XmlAttribute(#[from] AttrError),

    #[error("Xml element <{0}> is never closed")]
    XmlUnclosedElement(String),

    #[error("Xml document has no root element")]
    XmlNoRoot,

    #[error("Unexpected {0} outside of the root element")]
    XmlOutsideRoot(String),

    #[error("Unknown document encoding {0}")]
    UnknownEncoding(String),

    #[error("Document is not valid {0}")]
    Decoding(&'static str),

    #[error("Missing required element <{0}>")]
    MissingElement(&'static str),

    #[error("Element <{element}> is missing its {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Element <{0}> must appear at most once")]
    RepeatedElement(&'static str),

    #[error("Element <{0}> holds bare text instead of child elements")]
    UnstructuredElement(&'static str),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

pub type Result<T, E = Error> = result::Result<T, E>;
