//! Metadata extraction from the `<description>` header of a FictionBook
//! document.

use std::{borrow::Cow, fmt};

use tracing::debug;
use url::Url;

use crate::{
    xml::{decode, Element},
    Error, Result, FB2_NAMESPACE, UNKNOWN_AUTHOR,
};

static BODY_TAG: &[u8] = b"<body>";

/// Appended in place of the discarded body so the document stays well-formed
static BODY_REPLACEMENT: &[u8] = b"<body/></FictionBook>";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub home_page: Option<Url>,
}

impl Author {
    /// Read an `<author>` element, `None` when it names nobody
    ///
    /// An author written as bare text (`<author>Leo Tolstoy</author>`) can't
    /// be split into name parts and is an error.
    fn from_element(element: &Element) -> Result<Option<Self>> {
        let author = Self {
            first_name: child_text(element, "first-name"),
            last_name: child_text(element, "last-name"),
            nickname: child_text(element, "nickname"),
            home_page: child_text(element, "home-page").and_then(|home_page| {
                Url::parse(&home_page)
                    .map_err(|err| debug!("dropping home page {home_page:?}: {err}"))
                    .ok()
            }),
        };

        if author.first_name.is_none() && author.last_name.is_none() && author.nickname.is_none()
        {
            if !element.text().is_empty() {
                return Err(Error::UnstructuredElement("author"));
            }

            return Ok(None);
        }

        Ok(Some(author))
    }

    fn list_from(parent: &Element) -> Result<Vec<Self>> {
        parent
            .field("author")
            .into_vec()
            .into_iter()
            .filter_map(|element| Self::from_element(element).transpose())
            .collect()
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = [self.last_name.as_deref(), self.first_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        match (name.is_empty(), self.nickname.as_deref()) {
            (false, Some(nickname)) => write!(f, "{name} ({nickname})"),
            (false, None) => f.write_str(&name),
            (true, nickname) => f.write_str(nickname.unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub name: String,
    pub number: String,
}

impl Sequence {
    fn from_element(element: &Element) -> Result<Self> {
        let Some(name) = element.attribute("name") else {
            return Err(Error::MissingAttribute {
                element: "sequence",
                attribute: "name",
            });
        };

        Ok(Self {
            name: name.to_owned(),
            number: element.attribute("number").unwrap_or("0").to_owned(),
        })
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.number)
    }
}

/// Bibliographic metadata of one book, rendered by `Display` as its summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookInfo {
    pub authors: Vec<Author>,
    pub sequences: Vec<Sequence>,
    pub title: String,
    pub genres: Vec<String>,
}

impl BookInfo {
    /// Extract the metadata out of the document root
    ///
    /// ## Errors
    ///
    /// Fails if the root isn't `FictionBook`, if `description`, `title-info`
    /// or `book-title` is missing or repeated, if a sequence has no name, or
    /// if an author is given as bare text
    pub fn from_root(root: &Element) -> Result<Self> {
        if root.name() != "FictionBook" {
            debug!("unexpected root element <{}>", root.name());
            return Err(Error::MissingElement("FictionBook"));
        }

        if root.namespace() != Some(FB2_NAMESPACE) {
            debug!("unexpected root namespace {:?}", root.namespace());
        }

        let description = root.required_child("description")?;
        let title_info = description.required_child("title-info")?;
        let document_info = description.child("document-info")?;

        let mut authors = Author::list_from(title_info)?;
        if authors.is_empty() {
            if let Some(document_info) = document_info {
                authors = Author::list_from(document_info)?;
            }
        }

        let sequences = title_info
            .field("sequence")
            .into_vec()
            .into_iter()
            .map(Sequence::from_element)
            .collect::<Result<Vec<_>>>()?;

        let title = title_info.required_child("book-title")?.text().to_owned();

        let genres = title_info
            .field("genre")
            .into_vec()
            .into_iter()
            .map(Element::text)
            .filter(|genre| !genre.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        Ok(Self {
            authors,
            sequences,
            title,
            genres,
        })
    }
}

impl fmt::Display for BookInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authors = join(&self.authors);
        if authors.is_empty() {
            f.write_str(UNKNOWN_AUTHOR)?;
        } else {
            f.write_str(&authors)?;
        }

        if !self.sequences.is_empty() {
            write!(f, " / {}", join(&self.sequences))?;
        }

        write!(
            f,
            " / {}, genres: {}",
            self.title,
            self.genres.join(", ")
        )
    }
}

fn join(items: &[impl fmt::Display]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn child_text(element: &Element, name: &str) -> Option<String> {
    element
        .field(name)
        .into_vec()
        .into_iter()
        .next()
        .map(Element::text)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

/// Replace everything from the first `<body>` on with an empty body.
///
/// The metadata lives in the header, and real-world bodies often carry
/// invalid markup.
#[must_use]
pub fn truncate_body(bytes: &[u8]) -> Cow<'_, [u8]> {
    let Some(offset) = bytes
        .windows(BODY_TAG.len())
        .position(|window| window == BODY_TAG)
    else {
        return Cow::Borrowed(bytes);
    };

    debug!("dropping {} bytes of body", bytes.len() - offset);

    let mut truncated = Vec::with_capacity(offset + BODY_REPLACEMENT.len());
    truncated.extend_from_slice(&bytes[..offset]);
    truncated.extend_from_slice(BODY_REPLACEMENT);

    Cow::Owned(truncated)
}

/// Parse the raw content of a `.fb2` file
///
/// ## Errors
///
/// Fails if the header isn't well-formed XML in its declared encoding, or if
/// a mandatory element is missing
pub fn parse_fb2(bytes: &[u8]) -> Result<BookInfo> {
    let bytes = truncate_body(bytes);
    let text = decode(&bytes)?;
    let root = Element::parse(&text)?;

    BookInfo::from_root(&root)
}

/// One line summary of the raw content of a `.fb2` file
///
/// ## Errors
///
/// Same errors as `parse_fb2`
pub fn summarize(bytes: &[u8]) -> Result<String> {
    parse_fb2(bytes).map(|book| book.to_string())
}
