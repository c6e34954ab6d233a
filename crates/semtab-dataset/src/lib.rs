//! Semtab dataset storage
//!
//! A dataset is a directory (or a `.zip` of one) laid out as:
//!
//! ```text
//! <root>/
//!   descriptions/
//!     <id>.json | <id>.yml | <id>/version.NN.json | part-NNNN.zip
//!   tables/
//!     <id>.json[.gz|.bz2|.lz4] | <id>.csv | <id>.xlsx | part-NNNN.zip
//! ```
//!
//! [`Dataset::load`] reads every table with its semantic models;
//! [`Dataset::save`] writes them back either one file per table or in
//! batched zip parts.

pub mod codec;
pub mod error;
pub mod fs_id;
pub mod parallel;
mod root;
pub mod sampling;
pub mod simple_tree;

pub use codec::{Compression, TableFormat};
pub use error::{DatasetError, Result};
pub use fs_id::{get_friendly_fs_id, slugify};
pub use parallel::{parallel_map, parallel_map_lenient, ParallelMapError, ParallelOptions};
pub use sampling::sample_table_data;
pub use simple_tree::{deser_simple_tree_yaml, ser_simple_tree_yaml, SIMPLE_TREE_VERSION};

use root::{is_zip_path, DatasetRoot, RootEntry};
use semtab_model::{
    Example, FullTable, Namespace, PrefixedModelRecord, SemanticModel, SemanticModelRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DESCRIPTIONS_DIR: &str = "descriptions";
pub const TABLES_DIR: &str = "tables";

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Log each table as it is read.
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// Codec for per-table files; ignored when batching.
    pub individual_table_compressed: Option<Compression>,
    pub batch_compressed: bool,
    pub batch_size: usize,
    /// JSON indentation of per-table files: 0 (compact) or 2.
    pub table_fmt_indent: u8,
    /// Remove existing `descriptions/` and `tables/` before writing.
    pub clean_previous_data: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            individual_table_compressed: None,
            batch_compressed: false,
            batch_size: 100,
            table_fmt_indent: 0,
            clean_previous_data: true,
        }
    }
}

impl SaveOptions {
    pub fn validate(&self) -> Result<()> {
        if self.batch_compressed && self.batch_size == 0 {
            return Err(DatasetError::InvalidOption(
                "batch_size must be positive".into(),
            ));
        }
        if !matches!(self.table_fmt_indent, 0 | 2) {
            return Err(DatasetError::InvalidOption(format!(
                "table_fmt_indent must be 0 or 2, got {}",
                self.table_fmt_indent
            )));
        }
        Ok(())
    }
}

// ============================================================================
// File name helpers
// ============================================================================

/// Every `.suffix` of a file name, in order; a leading dot does not start one.
fn suffixes(name: &str) -> Vec<String> {
    let trimmed = name.trim_start_matches('.');
    trimmed
        .split('.')
        .skip(1)
        .map(|s| format!(".{s}"))
        .collect()
}

/// Name with every suffix removed.
fn base_name(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Name with only its last suffix removed.
fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

fn description_version(file_name: &str) -> Option<u64> {
    file_name.split('.').nth(1)?.parse().ok()
}

#[derive(Deserialize)]
struct YamlDescriptions {
    #[serde(default)]
    prefixes: BTreeMap<String, String>,
    models: Vec<PrefixedModelRecord>,
}

/// Decode a description file into semantic models. JSON holds a list of
/// model records; YAML holds prefixed models plus their prefix table.
pub fn decode_descriptions(file_name: &str, data: &[u8]) -> Result<Vec<SemanticModel>> {
    if file_name.ends_with(".json") {
        let records: Vec<SemanticModelRecord> = serde_json::from_slice(data)?;
        return records
            .into_iter()
            .map(|r| SemanticModel::from_record(r).map_err(DatasetError::from))
            .collect();
    }
    if file_name.ends_with(".yml") || file_name.ends_with(".yaml") {
        let doc: YamlDescriptions = serde_yaml::from_slice(data)?;
        let ns = Namespace::from_prefix2ns(doc.prefixes);
        return doc
            .models
            .into_iter()
            .map(|r| SemanticModel::from_prefixed_record(r, &ns).map_err(DatasetError::from))
            .collect();
    }
    Err(DatasetError::UnsupportedFormat {
        kind: "description file",
        tag: file_name.to_string(),
    })
}

// ============================================================================
// Dataset
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    location: PathBuf,
}

impl Dataset {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn is_zip_file(&self) -> bool {
        is_zip_path(&self.location)
    }

    /// Load every example, ordered by table file name.
    ///
    /// Without a `descriptions/` directory every example gets an empty list
    /// of semantic models.
    pub fn load(&self, options: &LoadOptions) -> Result<Vec<Example<FullTable>>> {
        let mut root = DatasetRoot::open(&self.location)?;
        if !root.is_dir(TABLES_DIR) {
            return Err(DatasetError::InvalidLayout(format!(
                "`{}` has no `{TABLES_DIR}/` directory",
                self.location.display()
            )));
        }
        let has_descriptions = root.is_dir(DESCRIPTIONS_DIR);
        let entries = root.list(TABLES_DIR)?;
        let total = entries.len();

        let mut examples = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            let suffixes = suffixes(&entry.name);
            if entry.name.starts_with('.') || suffixes.is_empty() {
                debug!(file = %entry.name, "skipping table entry");
                continue;
            }
            if entry.is_dir {
                warn!(dir = %entry.name, "skipping directory inside tables/");
                continue;
            }
            if options.verbose {
                info!(progress = %format!("{}/{total}", i + 1), file = %entry.name, "loading table");
            } else {
                debug!(file = %entry.name, "loading table");
            }

            if suffixes.last().map(String::as_str) == Some(".zip") {
                let dir = root.local_dir().ok_or_else(|| {
                    DatasetError::InvalidLayout(
                        "zip parts cannot be nested inside a zipped dataset".into(),
                    )
                })?;
                examples.extend(load_part(dir, &entry.name, has_descriptions)?);
                continue;
            }
            examples.push(load_single(&mut root, &entry, &suffixes, has_descriptions)?);
        }

        info!(
            location = %self.location.display(),
            examples = examples.len(),
            "loaded dataset"
        );
        Ok(examples)
    }

    /// Write `examples` under the dataset location. Saving into a zip
    /// archive is not supported.
    pub fn save(&self, examples: &[Example<FullTable>], options: &SaveOptions) -> Result<()> {
        if self.is_zip_file() {
            return Err(DatasetError::InvalidLayout(
                "saving into a zip archive is not supported".into(),
            ));
        }
        options.validate()?;

        let desc_dir = self.location.join(DESCRIPTIONS_DIR);
        let table_dir = self.location.join(TABLES_DIR);
        for dir in [&desc_dir, &table_dir] {
            if options.clean_previous_data && dir.exists() {
                fs::remove_dir_all(dir)?;
            }
            fs::create_dir_all(dir)?;
        }

        if options.batch_compressed {
            save_batched(examples, options.batch_size, &desc_dir, &table_dir)?;
        } else {
            for example in examples {
                save_single(example, options, &desc_dir, &table_dir)?;
            }
        }

        info!(
            location = %self.location.display(),
            examples = examples.len(),
            batched = options.batch_compressed,
            "saved dataset"
        );
        Ok(())
    }
}

// ============================================================================
// Loading
// ============================================================================

fn load_single(
    root: &mut DatasetRoot,
    entry: &RootEntry,
    suffixes: &[String],
    has_descriptions: bool,
) -> Result<Example<FullTable>> {
    let example_id = base_name(&entry.name);
    let mut data = root.read(&format!("{TABLES_DIR}/{}", entry.name))?;
    if suffixes.len() > 1 {
        let ext = suffixes[suffixes.len() - 1].trim_start_matches('.');
        let codec = Compression::from_extension(ext).ok_or_else(|| {
            DatasetError::UnsupportedFormat {
                kind: "table compression",
                tag: ext.to_string(),
            }
        })?;
        data = codec.decompress(&data)?;
    }
    let format = TableFormat::from_suffix(&suffixes[0])?;
    let table = codec::decode_table(example_id, &data, format)?;

    let sms = if has_descriptions {
        read_description(root, example_id)?
    } else {
        Vec::new()
    };
    Ok(Example::new(sms, table))
}

/// Latest version of a versioned description directory, or the flat
/// `<id>.json` / `<id>.yml` file.
fn read_description(root: &mut DatasetRoot, example_id: &str) -> Result<Vec<SemanticModel>> {
    let dir = format!("{DESCRIPTIONS_DIR}/{example_id}");
    if root.is_dir(&dir) {
        let mut latest: Option<(u64, String)> = None;
        for entry in root.list(&dir)? {
            if entry.is_dir {
                continue;
            }
            let version = description_version(&entry.name).ok_or_else(|| {
                DatasetError::InvalidLayout(format!(
                    "description `{dir}/{}` has no numeric version",
                    entry.name
                ))
            })?;
            if latest.as_ref().map_or(true, |(v, _)| version > *v) {
                latest = Some((version, entry.name));
            }
        }
        let (version, file) =
            latest.ok_or_else(|| DatasetError::MissingDescription(example_id.to_string()))?;
        debug!(example = example_id, version, "using latest description");
        let data = root.read(&format!("{dir}/{file}"))?;
        return decode_descriptions(&file, &data);
    }

    for ext in [".json", ".yml"] {
        let rel = format!("{dir}{ext}");
        if root.is_file(&rel) {
            let data = root.read(&rel)?;
            return decode_descriptions(&rel, &data);
        }
    }
    Err(DatasetError::MissingDescription(example_id.to_string()))
}

/// Load one batched part: `tables/<name>` paired member-by-member with
/// `descriptions/<name>` by file stem.
fn load_part(dir: &Path, name: &str, has_descriptions: bool) -> Result<Vec<Example<FullTable>>> {
    let mut tables: Vec<Option<FullTable>> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    let mut archive = ZipArchive::new(File::open(dir.join(TABLES_DIR).join(name))?)?;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let member = file.name().to_string();
        if !member.ends_with(".json") {
            continue;
        }
        let stem = file_stem(&member).to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let table = codec::decode_table(&stem, &data, TableFormat::Json)?;
        match slots.get(&stem) {
            Some(&slot) => tables[slot] = Some(table),
            None => {
                slots.insert(stem, tables.len());
                tables.push(Some(table));
            }
        }
    }

    if !has_descriptions {
        return Ok(tables
            .into_iter()
            .flatten()
            .map(|table| Example::new(Vec::new(), table))
            .collect());
    }

    let expected = tables.len();
    let mut examples = Vec::with_capacity(expected);
    let mut archive = ZipArchive::new(File::open(dir.join(DESCRIPTIONS_DIR).join(name))?)?;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let member = file.name().to_string();
        let stem = file_stem(&member);
        let Some(&slot) = slots.get(stem) else {
            continue;
        };
        let table = tables[slot].take().ok_or_else(|| {
            DatasetError::Inconsistent(format!("{name}: duplicate description for `{stem}`"))
        })?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        examples.push(Example::new(decode_descriptions(&member, &data)?, table));
    }

    if examples.len() != expected {
        return Err(DatasetError::Inconsistent(format!(
            "{name}: {expected} tables but {} matching descriptions",
            examples.len()
        )));
    }
    Ok(examples)
}

// ============================================================================
// Saving
// ============================================================================

fn save_single(
    example: &Example<FullTable>,
    options: &SaveOptions,
    desc_dir: &Path,
    table_dir: &Path,
) -> Result<()> {
    let fs_id = get_friendly_fs_id(example.table.id())?;

    let version_dir = desc_dir.join(&fs_id);
    fs::create_dir_all(&version_dir)?;
    fs::write(
        version_dir.join("version.01.json"),
        serde_json::to_vec_pretty(&example.sms)?,
    )?;

    let data = match options.table_fmt_indent {
        0 => serde_json::to_vec(&example.table)?,
        _ => serde_json::to_vec_pretty(&example.table)?,
    };
    match options.individual_table_compressed {
        Some(codec) => fs::write(
            table_dir.join(format!("{fs_id}.json.{}", codec.extension())),
            codec.compress(&data)?,
        )?,
        None => fs::write(table_dir.join(format!("{fs_id}.json")), data)?,
    }
    Ok(())
}

fn save_batched(
    examples: &[Example<FullTable>],
    batch_size: usize,
    desc_dir: &Path,
    table_dir: &Path,
) -> Result<()> {
    let file_options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (i, chunk) in examples.chunks(batch_size).enumerate() {
        let part = format!("part-{i:04}.zip");
        let mut descriptions = ZipWriter::new(File::create(desc_dir.join(&part))?);
        let mut tables = ZipWriter::new(File::create(table_dir.join(&part))?);
        for example in chunk {
            let member = format!("{}.json", get_friendly_fs_id(example.table.id())?);
            descriptions.start_file(member.as_str(), file_options)?;
            descriptions.write_all(&serde_json::to_vec(&example.sms)?)?;
            tables.start_file(member.as_str(), file_options)?;
            tables.write_all(&serde_json::to_vec(&example.table)?)?;
        }
        descriptions.finish()?;
        tables.finish()?;
        debug!(part = %part, examples = chunk.len(), "wrote batch");
    }
    Ok(())
}
