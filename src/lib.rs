//! # aarpack
//!
//! A Rust library for assembling Android library archives (`.aar`) from
//! pre-built inputs.
//!
//! ## Overview
//!
//! An `.aar` bundles everything an Android library ships: compiled classes,
//! resources, resource-id tables, ProGuard rules, native libraries and
//! assets. Producing one is pure packaging, and this library provides the
//! pieces:
//!
//! - Merging class archives into a single `classes.jar`, with include and
//!   exclude glob filtering
//! - Merging and renumbering `R.txt` resource-id tables from many libraries
//!   into one consistent id space
//! - Repackaging resource zips under `res/` with collision-free value
//!   resource names
//! - Deterministic output: fixed entry metadata, byte-identical archives for
//!   identical inputs
//! - Atomic writes and ninja depfile emission for build-system integration
//!
//! ## Example
//!
//! ```rust,no_run
//! use aarpack::{write_aar, AarRequest};
//!
//! fn main() -> anyhow::Result<()> {
//!     let request = AarRequest {
//!         output: "library.aar".into(),
//!         manifest: "AndroidManifest.xml".into(),
//!         jars: vec!["obj/classes.jar".into()],
//!         r_text_files: vec!["gen/R.txt".into()],
//!         r_text_renumber: true,
//!         ..Default::default()
//!     };
//!     write_aar(&request)?;
//!     Ok(())
//! }
//! ```

pub mod aar;
pub mod depfile;
pub mod error;
pub mod filter;
pub mod gn;
pub mod rtxt;
pub mod zip_util;

pub use aar::{write_aar, AarRequest, AssetPair};
pub use depfile::write_depfile;
pub use error::{Error, Result};
pub use filter::{IncludeGlobs, PathTransform};
pub use gn::{expand_file_args, parse_list};
pub use rtxt::{merge_rtxt_files, RtxtRecord, RtxtTable};
pub use zip_util::{merge_zips, ZipOut};
