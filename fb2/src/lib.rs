#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::{
    fs::File,
    io::{Cursor, Read, Seek},
    path::Path,
    result,
};

use bytes::Bytes;
use tracing::debug;
use zip::{read::ZipFile, ZipArchive};

pub use crate::{
    book::{parse_fb2, summarize, Author, BookInfo, Sequence},
    errors::{Error, Result},
    walk::find_archives,
};

pub mod book;
pub mod errors;
pub mod walk;
pub mod xml;

pub static FB2_NAMESPACE: &str = "http://www.gribuser.ru/xml/fictionbook/2.0";

pub static FB2_SUFFIX: &str = ".fb2";

pub static ZIP_SUFFIX: &str = ".zip";

/// Books read from a single archive before the rest is skipped
pub static MAX_BOOKS_PER_ARCHIVE: usize = 101;

pub static UNKNOWN_AUTHOR: &str = "Unknown author";

pub trait Fb2Read {
    /// Number of entries in the archive, books or not
    fn entry_count(&self) -> usize;

    /// Number of `.fb2` entries, ignoring `MAX_BOOKS_PER_ARCHIVE`
    fn book_count(&self) -> usize;

    /// Name of the entry at `index`, read from the archive directory without
    /// decompressing or decrypting the entry
    ///
    /// ## Errors
    ///
    /// Fails if the entry can't be found or its header can't be read
    fn name_by_index(&mut self, index: usize) -> Result<String>;

    /// Lookup the entry at `index` in the archive
    ///
    /// ## Errors
    ///
    /// Fails if the entry can't be found or its content can't be decoded
    fn read_by_index(&mut self, index: usize) -> Result<Fb2File<'_>>;

    /// Iterate over the books of the archive in archive order, stopping after
    /// `MAX_BOOKS_PER_ARCHIVE` of them. Entries that aren't books are never opened.
    /// If the closure returns an error, this error is returned immediately.
    ///
    /// ## Errors
    ///
    /// Returns an error immediately if the provided closure returns an error
    fn try_for_each_book<F, E>(&mut self, mut f: F) -> result::Result<(), E>
    where
        F: FnMut(Result<Fb2File<'_>>) -> result::Result<(), E>,
    {
        let mut processed = 0;

        for index in 0..self.entry_count() {
            match self.name_by_index(index) {
                Ok(name) if !is_book_name(&name) => continue,
                Ok(_) => {}
                Err(err) => {
                    f(Err(err))?;
                    continue;
                }
            }

            if processed == MAX_BOOKS_PER_ARCHIVE {
                debug!("skipping books after the first {MAX_BOOKS_PER_ARCHIVE}");
                break;
            }
            processed += 1;

            f(self.read_by_index(index))?;
        }

        Ok(())
    }
}

/// Directories are stored with a trailing `/`, so they never match
fn is_book_name(name: &str) -> bool {
    name.ends_with(FB2_SUFFIX)
}

pub struct Fb2File<'a>(ZipFile<'a>);

impl<'a> Fb2File<'a> {
    /// Name of the entry inside the archive
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Read the whole decompressed content
    ///
    /// ## Errors
    ///
    /// Fails if file size is too large to fit a `usize` on host machine
    /// or if the content can't be read
    pub fn to_bytes(&mut self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(
            self.0
                .size()
                .try_into()
                .map_err(|_| Error::Fb2FileSizeConversion)?,
        );

        self.0.read_to_end(&mut buf)?;

        Ok(buf.into())
    }
}

impl<'a> From<ZipFile<'a>> for Fb2File<'a> {
    fn from(zip_file: ZipFile<'a>) -> Self {
        Self(zip_file)
    }
}

#[derive(Debug)]
pub struct Fb2Reader<R> {
    archive: ZipArchive<R>,
}

impl<R> Fb2Reader<R>
where
    R: Read + Seek,
{
    /// Creates `Fb2Reader` from a `Read`
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;

        Ok(Self { archive })
    }
}

impl Fb2Reader<File> {
    /// Creates `Fb2Reader` from a path
    ///
    /// ## Errors
    ///
    /// Fails if the file can't be open or the underlying `ZipArchive` can't be created
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        Self::from_reader(file)
    }
}

impl<'b> Fb2Reader<Cursor<&'b [u8]>> {
    /// Creates `Fb2Reader` from a bytes slice
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_bytes_slice(bytes: &'b [u8]) -> Result<Self> {
        let cursor = Cursor::new(bytes);

        Self::from_reader(cursor)
    }
}

impl<R> Fb2Read for Fb2Reader<R>
where
    R: Read + Seek,
{
    fn entry_count(&self) -> usize {
        self.archive.len()
    }

    fn book_count(&self) -> usize {
        self.archive
            .file_names()
            .filter(|name| is_book_name(name))
            .count()
    }

    fn name_by_index(&mut self, index: usize) -> Result<String> {
        // Raw access skips the compression method and encryption checks
        let archive_file = self.archive.by_index_raw(index)?;

        Ok(archive_file.name().to_string())
    }

    fn read_by_index(&mut self, index: usize) -> Result<Fb2File<'_>> {
        let archive_file = self.archive.by_index(index)?;

        Ok(archive_file.into())
    }
}
