use anyhow::{Context, Result};
use moonphase_core::{Harvest, merge_harvest};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::UpdateRecord;

const BOM: char = '\u{feff}';

/// Merge the harvest settings into `path`, rewriting the whole file.
///
/// The file is read once, merged in memory and written back through a
/// sibling staging file that is renamed over the original. Symlinks are
/// resolved first so the link target is the file that gets replaced. A
/// leading byte order mark is kept out of the merge and written back as is.
pub fn update_settings_file(path: &Path, harvest: &Harvest) -> Result<Vec<UpdateRecord>> {
    let target =
        fs::canonicalize(path).with_context(|| format!("failed to resolve {}", path.display()))?;
    let original = fs::read_to_string(&target)
        .with_context(|| format!("failed to read {}", target.display()))?;
    let (bom, body) = match original.strip_prefix(BOM) {
        Some(body) => (true, body),
        None => (false, original.as_str()),
    };

    let (merged, actions) = merge_harvest(body, harvest).context("building settings assignments")?;

    let records: Vec<UpdateRecord> = harvest
        .key_values()
        .into_iter()
        .zip(actions)
        .map(|((key, value), action)| {
            log::debug!("{action:?} {key}={value}");
            UpdateRecord {
                key: key.to_string(),
                value,
                action,
            }
        })
        .collect();

    let contents = if bom {
        format!("{BOM}{merged}")
    } else {
        merged
    };
    write_whole_file(&target, &contents)?;
    log::info!(
        "wrote {} settings to {}",
        records.len(),
        target.display()
    );
    Ok(records)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("settings"), OsString::from);
    name.push(".moonphase.tmp");
    path.with_file_name(name)
}

fn write_whole_file(path: &Path, contents: &str) -> Result<()> {
    let staging = staging_path(path);
    if let Err(err) = fs::write(&staging, contents) {
        let _ = fs::remove_file(&staging);
        return Err(err).with_context(|| format!("failed to write {}", staging.display()));
    }
    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(err).with_context(|| format!("failed to replace {}", path.display()));
    }
    Ok(())
}
