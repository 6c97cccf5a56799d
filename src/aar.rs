//! Android library archive assembly
//!
//! An `.aar` is a zip with a fixed internal layout: `AndroidManifest.xml`,
//! a merged `classes.jar`, the combined `R.txt` resource-id table, an empty
//! `public.txt`, an optional merged `proguard.txt`, then resources under
//! `res/`, native libraries under `jni/<abi>/`, and assets under `assets/`.
//!
//! Assembly is atomic: the archive is staged in a temporary file beside the
//! output and renamed into place only on full success, so a failing run
//! never leaves a partial archive at the destination.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::{IncludeGlobs, PathTransform};
use crate::rtxt;
use crate::zip_util::{self, ZipOut};

/// One `external:internal` asset mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    /// File read from disk.
    pub source: PathBuf,
    /// Destination path under `assets/`.
    pub dest: String,
}

impl AssetPair {
    /// Parse an `external:internal` pair. Exactly one colon separating two
    /// non-empty halves.
    pub fn parse(pair: &str) -> Result<Self> {
        let mut parts = pair.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(source), Some(dest), None) if !source.is_empty() && !dest.is_empty() => {
                Ok(Self {
                    source: PathBuf::from(source),
                    dest: dest.to_string(),
                })
            }
            _ => Err(Error::AssetPair(pair.to_string())),
        }
    }
}

/// Everything needed to assemble one archive.
#[derive(Debug, Default)]
pub struct AarRequest {
    pub output: PathBuf,
    pub manifest: PathBuf,
    pub jars: Vec<PathBuf>,
    pub dependencies_res_zips: Vec<PathBuf>,
    pub r_text_files: Vec<PathBuf>,
    pub r_text_renumber: bool,
    pub proguard_configs: Vec<PathBuf>,
    pub native_libraries: Vec<PathBuf>,
    pub abi: Option<String>,
    pub assets: Vec<AssetPair>,
    pub jar_excluded_globs: Vec<String>,
    pub jar_included_globs: Vec<String>,
    pub resource_included_globs: Vec<String>,
}

impl AarRequest {
    /// Every input consumed during assembly, in stable order, for
    /// dependency recording. Inputs skipped by include globs still count:
    /// changing them must re-trigger the action that filtered them out.
    pub fn input_paths(&self) -> Vec<&Path> {
        let mut inputs: Vec<&Path> = Vec::new();
        inputs.extend(self.jars.iter().map(PathBuf::as_path));
        inputs.extend(self.dependencies_res_zips.iter().map(PathBuf::as_path));
        inputs.extend(self.r_text_files.iter().map(PathBuf::as_path));
        inputs.extend(self.proguard_configs.iter().map(PathBuf::as_path));
        inputs.extend(self.native_libraries.iter().map(PathBuf::as_path));
        inputs.extend(self.assets.iter().map(|a| a.source.as_path()));
        inputs
    }
}

/// Assemble the archive described by `request`.
pub fn write_aar(request: &AarRequest) -> Result<()> {
    let abi = request.abi.as_deref();
    if !request.native_libraries.is_empty() && abi.is_none() {
        return Err(Error::MissingAbi);
    }

    let staging_dir = match request.output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(staging_dir)?;
    let staging = NamedTempFile::new_in(staging_dir)?;

    // Any early return drops `out`, which removes the staging file.
    let mut out = ZipOut::new(staging);

    out.add_file("AndroidManifest.xml", &request.manifest)?;

    // classes.jar is merged in its own scratch file first so a merge
    // failure never produces a half-written nested archive.
    let transform = PathTransform::new(&request.jar_excluded_globs, &request.jar_included_globs)?;
    let mut merged_jar = zip_util::merge_zips(tempfile::tempfile()?, &request.jars, &transform)?;
    merged_jar.seek(SeekFrom::Start(0))?;
    let mut jar_bytes = Vec::new();
    merged_jar.read_to_end(&mut jar_bytes)?;
    out.add_bytes("classes.jar", &jar_bytes)?;

    let include = IncludeGlobs::new(&request.resource_included_globs)?;
    let r_txt = rtxt::merge_rtxt_files(&request.r_text_files, &include, request.r_text_renumber)?;
    out.add_bytes("R.txt", r_txt.as_bytes())?;
    out.add_bytes("public.txt", b"")?;

    if !request.proguard_configs.is_empty() {
        let merged = merge_proguard_configs(&request.proguard_configs)?;
        out.add_bytes("proguard.txt", merged.as_bytes())?;
    }

    add_resource_zips(&mut out, &request.dependencies_res_zips, &include)?;

    if let Some(abi) = abi {
        for library in &request.native_libraries {
            let name = library
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::NativeLibPath(library.display().to_string()))?;
            out.add_file(&format!("jni/{abi}/{name}"), library)?;
        }
    }

    for asset in &request.assets {
        out.add_file(&format!("assets/{}", asset.dest), &asset.source)?;
    }

    let entries = out.len();
    let staging = out.finish()?;
    staging
        .persist(&request.output)
        .map_err(|e| Error::Io(e.error))?;
    info!("wrote {} ({} entries)", request.output.display(), entries);
    Ok(())
}

/// Concatenate config fragments, each preceded by a line naming its source.
fn merge_proguard_configs(configs: &[PathBuf]) -> Result<String> {
    let mut parts = Vec::with_capacity(configs.len() * 2);
    for config in configs {
        parts.push(format!("# FROM: {}", config.display()));
        parts.push(fs::read_to_string(config)?);
    }
    Ok(parts.join("\n"))
}

/// Copy resource archives under `res/`.
fn add_resource_zips<W>(
    out: &mut ZipOut<W>,
    resource_zips: &[PathBuf],
    include: &IncludeGlobs,
) -> Result<()>
where
    W: Write + Seek,
{
    for (ordinal, path) in resource_zips.iter().enumerate() {
        if !include.matches(path) {
            debug!(
                "skipping resource zip {} (not matched by include globs)",
                path.display()
            );
            continue;
        }
        zip_util::copy_zip_entries(out, path, |name| Some(resource_dest(name, ordinal)))?;
    }
    Ok(())
}

/// Destination path for one resource entry.
///
/// Entries in `values` directories share basenames across libraries
/// (`values/strings.xml` in every one), so those get an `_<ordinal>`
/// suffix before the extension. The ordinal is the source archive's
/// position, making the rename stable across runs.
fn resource_dest(name: &str, ordinal: usize) -> String {
    let (dirname, basename) = name.rsplit_once('/').unwrap_or(("", name));
    if dirname.contains("values") {
        let (root, ext) = split_ext(basename);
        format!("res/{dirname}/{root}_{ordinal}{ext}")
    } else {
        format!("res/{name}")
    }
}

/// Split a basename into (root, extension). Leading dots never start an
/// extension, so `.gitkeep` has none.
fn split_ext(basename: &str) -> (&str, &str) {
    let stripped = basename.trim_start_matches('.');
    let lead = basename.len() - stripped.len();
    match stripped.rfind('.') {
        Some(idx) => basename.split_at(lead + idx),
        None => (basename, ""),
    }
}
