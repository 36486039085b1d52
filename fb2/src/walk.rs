use camino::{Utf8Path, Utf8PathBuf};
use glob::{glob, Pattern};
use tracing::{debug, error};

use crate::{Result, ZIP_SUFFIX};

/// Zip archives to process for `path`: every `.zip` file below it when it is
/// a directory, the path itself otherwise
///
/// ## Errors
///
/// Fails when the glob is invalid or a directory can't be read
pub fn find_archives(path: impl AsRef<Utf8Path>) -> Result<Vec<Utf8PathBuf>> {
    let path = path.as_ref();

    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let pattern = format!(
        "{}/**/*{ZIP_SUFFIX}",
        Pattern::escape(path.as_str().trim_end_matches('/'))
    );
    let mut archives = Vec::new();

    for entry in glob(&pattern)? {
        let entry = match Utf8PathBuf::from_path_buf(entry?) {
            Ok(entry) => entry,
            Err(entry) => {
                error!("{entry:?} is not a valid utf-8 path");
                continue;
            }
        };

        if entry.is_dir() {
            debug!("skipping directory {entry}");
            continue;
        }

        archives.push(entry);
    }

    Ok(archives)
}
