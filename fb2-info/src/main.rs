#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::{env, io};

use anyhow::{anyhow, Result};
use camino::Utf8PathBuf;
use clap::Parser;

use crate::report::Reporter;

mod report;

#[derive(Parser, Debug)]
#[clap(about, author, version)]
pub struct Args {
    /// Directories or zip archives holding .fb2 books
    pub paths: Vec<Utf8PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = Args::parse();

    let dump_dir = Utf8PathBuf::from_path_buf(env::temp_dir())
        .map_err(|path| anyhow!("temporary directory {path:?} is not a valid utf-8 path"))?;

    let mut reporter = Reporter::new(io::stdout().lock(), dump_dir);

    for path in &args.paths {
        reporter.process_path(path)?;
    }

    Ok(())
}
