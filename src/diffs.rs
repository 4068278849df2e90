#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use glob::{Pattern, glob};

use crate::{constants::DIFF_EXTENSIONS, parsers::parser};

/// Lists the diff files directly inside `dir`, sorted by path. Fails when
/// `dir` is not a directory.
pub fn get_all(dir: &Path) -> Result<Vec<PathBuf>> {
    ensure!(dir.is_dir(), "{} is not a directory", dir.display());

    let dir = dir
        .to_str()
        .context("Could not convert diff directory to string")?;
    let dir = Pattern::escape(dir.trim_end_matches(std::path::MAIN_SEPARATOR));
    let mut files = Vec::new();

    for extension in DIFF_EXTENSIONS {
        let pattern = format!("{dir}{}*.{extension}", std::path::MAIN_SEPARATOR);

        files.extend(
            glob(&pattern)
                .context("Could not create glob")?
                .filter_map(Result::ok)
                .filter(|p| p.is_file()),
        );
    }

    files.sort();
    Ok(files)
}

/// Parses the group number out of a diff file name, eg. `group12.diff` is 12.
pub fn group_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    parser::leading_group_number(stem).ok()
}
