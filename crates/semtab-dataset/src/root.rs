//! Uniform read access to a dataset stored as a directory or a zip archive.

use crate::error::{DatasetError, Result};
use crate::DESCRIPTIONS_DIR;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RootEntry {
    pub name: String,
    pub is_dir: bool,
}

pub(crate) enum DatasetRoot {
    Dir(PathBuf),
    Zip {
        archive: ZipArchive<File>,
        names: Vec<String>,
        prefix: String,
    },
}

pub(crate) fn is_zip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zip")
}

/// The dataset root inside an archive: the archive itself when it holds
/// `descriptions/` directly, otherwise its single top-level entry when that
/// entry holds `descriptions/`.
pub(crate) fn resolve_zip_prefix(names: &[String]) -> Result<String> {
    let descriptions = format!("{DESCRIPTIONS_DIR}/");
    if names.iter().any(|n| n.starts_with(&descriptions)) {
        return Ok(String::new());
    }

    let mut top_level: Vec<&str> = names
        .iter()
        .map(|n| n.split('/').next().unwrap_or(n.as_str()))
        .filter(|n| !n.is_empty())
        .collect();
    top_level.sort_unstable();
    top_level.dedup();

    if let [only] = top_level.as_slice() {
        let prefix = format!("{only}/");
        let nested = format!("{prefix}{descriptions}");
        if names.iter().any(|n| n.starts_with(&nested)) {
            return Ok(prefix);
        }
    }
    Err(DatasetError::InvalidLayout(format!(
        "archive must contain `{DESCRIPTIONS_DIR}/` at its root or inside a single top-level directory (found {} top-level entries)",
        top_level.len()
    )))
}

impl DatasetRoot {
    pub fn open(location: &Path) -> Result<Self> {
        if !is_zip_path(location) {
            return Ok(DatasetRoot::Dir(location.to_path_buf()));
        }
        let archive = ZipArchive::new(File::open(location)?)?;
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let prefix = resolve_zip_prefix(&names)?;
        Ok(DatasetRoot::Zip {
            archive,
            names,
            prefix,
        })
    }

    pub fn local_dir(&self) -> Option<&Path> {
        match self {
            DatasetRoot::Dir(dir) => Some(dir),
            DatasetRoot::Zip { .. } => None,
        }
    }

    pub fn is_dir(&self, rel: &str) -> bool {
        match self {
            DatasetRoot::Dir(dir) => dir.join(rel).is_dir(),
            DatasetRoot::Zip { names, prefix, .. } => {
                let dir = format!("{prefix}{rel}/");
                names.iter().any(|n| n.starts_with(&dir))
            }
        }
    }

    pub fn is_file(&self, rel: &str) -> bool {
        match self {
            DatasetRoot::Dir(dir) => dir.join(rel).is_file(),
            DatasetRoot::Zip { names, prefix, .. } => {
                let full = format!("{prefix}{rel}");
                names.iter().any(|n| *n == full)
            }
        }
    }

    /// Immediate children of a directory, sorted by name.
    pub fn list(&self, rel: &str) -> Result<Vec<RootEntry>> {
        match self {
            DatasetRoot::Dir(dir) => {
                let mut entries = Vec::new();
                for entry in fs::read_dir(dir.join(rel))? {
                    let entry = entry?;
                    entries.push(RootEntry {
                        name: entry.file_name().to_string_lossy().into_owned(),
                        is_dir: entry.file_type()?.is_dir(),
                    });
                }
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(entries)
            }
            DatasetRoot::Zip { names, prefix, .. } => {
                let dir = format!("{prefix}{rel}/");
                let mut children: BTreeMap<String, bool> = BTreeMap::new();
                for rest in names.iter().filter_map(|n| n.strip_prefix(&dir)) {
                    let (name, is_dir) = match rest.split_once('/') {
                        Some((name, _)) => (name, true),
                        None => (rest, false),
                    };
                    if name.is_empty() {
                        continue;
                    }
                    *children.entry(name.to_string()).or_default() |= is_dir;
                }
                Ok(children
                    .into_iter()
                    .map(|(name, is_dir)| RootEntry { name, is_dir })
                    .collect())
            }
        }
    }

    pub fn read(&mut self, rel: &str) -> Result<Vec<u8>> {
        match self {
            DatasetRoot::Dir(dir) => Ok(fs::read(dir.join(rel))?),
            DatasetRoot::Zip {
                archive, prefix, ..
            } => {
                let mut file = archive.by_name(&format!("{prefix}{rel}"))?;
                let mut data = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut data)?;
                Ok(data)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prefix_for_flat_archive() {
        let n = names(&["descriptions/a.json", "tables/a.json"]);
        assert_eq!(resolve_zip_prefix(&n).unwrap(), "");
    }

    #[test]
    fn prefix_for_single_wrapped_directory() {
        let n = names(&["wt/", "wt/descriptions/a.json", "wt/tables/a.json"]);
        assert_eq!(resolve_zip_prefix(&n).unwrap(), "wt/");
    }

    #[test]
    fn two_top_level_directories_are_rejected() {
        let n = names(&["a/descriptions/x.json", "b/tables/x.json"]);
        assert!(matches!(
            resolve_zip_prefix(&n),
            Err(DatasetError::InvalidLayout(_))
        ));
    }

    #[test]
    fn wrapped_directory_without_descriptions_is_rejected() {
        let n = names(&["wt/tables/a.json"]);
        assert!(resolve_zip_prefix(&n).is_err());
    }
}
