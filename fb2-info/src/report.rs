use std::{fs, io::Write};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fb2::{find_archives, summarize, Fb2Read, Fb2Reader};
use sanitize_filename::{sanitize_with_options, Options};
use tracing::{debug, error};

/// Prints one line per book of every archive found, stopping at the first
/// book that can't be parsed
pub struct Reporter<W> {
    out: W,
    dump_dir: Utf8PathBuf,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, dump_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            out,
            dump_dir: dump_dir.into(),
        }
    }

    /// ## Errors
    ///
    /// Fails on the first archive that can't be read or book that can't be parsed
    pub fn process_path(&mut self, path: &Utf8Path) -> Result<()> {
        for archive in find_archives(path)? {
            self.process_archive(&archive)?;
        }

        Ok(())
    }

    /// ## Errors
    ///
    /// Fails if the archive can't be read or one of its books can't be parsed,
    /// in which case the book content is first dumped to the dump directory
    pub fn process_archive(&mut self, path: &Utf8Path) -> Result<()> {
        writeln!(self.out, "Processing file: {path}")?;

        let mut reader =
            Fb2Reader::from_path(path).with_context(|| format!("failed to open archive {path}"))?;
        debug!("{path} holds {} books", reader.book_count());

        reader.try_for_each_book(|file| -> Result<()> {
            let mut file = file.with_context(|| format!("failed to read archive {path}"))?;
            let name = file.name().to_string();
            let bytes = file
                .to_bytes()
                .with_context(|| format!("failed to read {path}/{name}"))?;

            let err = match summarize(&bytes) {
                Ok(summary) => {
                    writeln!(self.out, "  {name}: {summary}")?;
                    return Ok(());
                }
                Err(err) => err,
            };

            match dump_book(&self.dump_dir, &name, &bytes) {
                Ok(dump_path) => {
                    writeln!(
                        self.out,
                        "While parsing {path}/{name}, written to {dump_path}:"
                    )?;
                }
                Err(dump_err) => error!("failed to dump {path}/{name}: {dump_err}"),
            }

            Err(err).with_context(|| format!("failed to parse {path}/{name}"))
        })
    }
}

/// Write `bytes` under `dump_dir`, named after the archive entry.
/// The name is sanitized so it can't point outside of `dump_dir`
fn dump_book(dump_dir: &Utf8Path, name: &str, bytes: &[u8]) -> std::io::Result<Utf8PathBuf> {
    let file_name = sanitize_with_options(
        name,
        Options {
            windows: cfg!(windows),
            truncate: true,
            replacement: "_",
        },
    );
    let dump_path = dump_dir.join(file_name);

    fs::write(&dump_path, bytes)?;

    Ok(dump_path)
}
