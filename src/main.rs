//! aarpack - Assemble an Android library archive (.aar) from build outputs
//!
//! Usage:
//!   aarpack --output lib.aar --jars '["obj/classes.jar"]' \
//!       --dependencies-res-zips '["gen/res.zip"]' \
//!       --r-text-files '["gen/R.txt"]' --r-text-renumber \
//!       --proguard-configs '[]' --assets '[]'
//!
//! List-valued flags take GN list literals (`["a", "b"]`) or
//! whitespace-separated paths. Any argument may pull its value out of a
//! JSON build config with `@FileArg(path:key[:subkey])`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aarpack::{depfile, gn, write_aar, AarRequest, AssetPair};

#[derive(Parser)]
#[command(name = "aarpack")]
#[command(version = "0.1.0")]
#[command(about = "Assemble an Android library archive (.aar)", long_about = None)]
struct Cli {
    /// Path to the output aar
    #[arg(long)]
    output: PathBuf,

    /// GN list of jars merged into classes.jar
    #[arg(long)]
    jars: String,

    /// GN list of resource zips packaged under res/
    #[arg(long)]
    dependencies_res_zips: String,

    /// GN list of R.txt files to merge
    #[arg(long)]
    r_text_files: String,

    /// Deduplicate and renumber the merged R.txt
    #[arg(long)]
    r_text_renumber: bool,

    /// GN list of ProGuard flag files to merge
    #[arg(long)]
    proguard_configs: String,

    /// GN list of external:internal asset pairs
    #[arg(long)]
    assets: String,

    /// Path to the AndroidManifest.xml to include
    #[arg(long)]
    android_manifest: Option<PathBuf>,

    /// GN list of native libraries; requires --abi when non-empty
    #[arg(long, default_value = "")]
    native_libraries: String,

    /// ABI (e.g. armeabi-v7a) for native libraries
    #[arg(long)]
    abi: Option<String>,

    /// GN list of globs for jar paths to exclude
    #[arg(long, default_value = "")]
    jar_excluded_globs: String,

    /// GN list of globs for jar paths to include
    #[arg(long, default_value = "")]
    jar_included_globs: String,

    /// GN list of globs selecting R.txt files and resource zips
    #[arg(long, default_value = "")]
    resource_included_globs: String,

    /// Write a ninja depfile listing all inputs
    #[arg(long)]
    depfile: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().collect();
    let expanded =
        gn::expand_file_args(&raw).context("Failed to expand @FileArg references")?;
    let cli = Cli::parse_from(expanded);

    let request = build_request(&cli)?;
    write_aar(&request)
        .with_context(|| format!("Failed to write {}", request.output.display()))?;

    if let Some(depfile_path) = &cli.depfile {
        depfile::write_depfile(depfile_path, &request.output, &request.input_paths())
            .with_context(|| format!("Failed to write depfile {}", depfile_path.display()))?;
    }

    Ok(())
}

/// Resolve CLI flags into a request, rejecting inconsistent arguments
/// before any input is opened.
fn build_request(cli: &Cli) -> Result<AarRequest> {
    let native_libraries = parse_path_list(&cli.native_libraries, "--native-libraries")?;
    if !native_libraries.is_empty() && cli.abi.is_none() {
        bail!("--abi is required when --native-libraries is non-empty");
    }

    let assets = parse_string_list(&cli.assets, "--assets")?
        .iter()
        .map(|pair| AssetPair::parse(pair))
        .collect::<aarpack::Result<Vec<_>>>()?;

    let manifest = match &cli.android_manifest {
        Some(path) => path.clone(),
        None => default_manifest_path()?,
    };

    Ok(AarRequest {
        output: cli.output.clone(),
        manifest,
        jars: parse_path_list(&cli.jars, "--jars")?,
        dependencies_res_zips: parse_path_list(
            &cli.dependencies_res_zips,
            "--dependencies-res-zips",
        )?,
        r_text_files: parse_path_list(&cli.r_text_files, "--r-text-files")?,
        r_text_renumber: cli.r_text_renumber,
        proguard_configs: parse_path_list(&cli.proguard_configs, "--proguard-configs")?,
        native_libraries,
        abi: cli.abi.clone(),
        assets,
        jar_excluded_globs: parse_string_list(&cli.jar_excluded_globs, "--jar-excluded-globs")?,
        jar_included_globs: parse_string_list(&cli.jar_included_globs, "--jar-included-globs")?,
        resource_included_globs: parse_string_list(
            &cli.resource_included_globs,
            "--resource-included-globs",
        )?,
    })
}

fn parse_string_list(value: &str, flag: &str) -> Result<Vec<String>> {
    gn::parse_list(value).with_context(|| format!("Bad GN list for {}", flag))
}

fn parse_path_list(value: &str, flag: &str) -> Result<Vec<PathBuf>> {
    let parsed = parse_string_list(value, flag)?;
    Ok(parsed.into_iter().map(PathBuf::from).collect())
}

/// The build ships a stock manifest next to the tool; use it when the
/// caller does not supply one.
fn default_manifest_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join("AndroidManifest.xml"))
}
