//! Glob-based filtering of file paths and archive entry names
//!
//! Patterns follow shell `fnmatch` semantics: `*` matches across `/`, so
//! `*/R.class` matches `com/example/R.class`. Matching is case sensitive.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::Result;

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Optional allow-list of path globs. An empty list admits every path.
#[derive(Debug)]
pub struct IncludeGlobs {
    set: Option<GlobSet>,
}

impl IncludeGlobs {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let set = if patterns.is_empty() {
            None
        } else {
            Some(build_glob_set(patterns)?)
        };
        Ok(Self { set })
    }

    /// An unrestricted filter.
    pub fn empty() -> Self {
        Self { set: None }
    }

    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        match &self.set {
            Some(set) => set.is_match(path.as_ref()),
            None => true,
        }
    }
}

/// Decides the destination path of each entry copied between archives.
///
/// Exclusions are checked before inclusions: an entry matched by both lists
/// is dropped. Entries surviving both checks keep their path unchanged,
/// though callers receive an owned destination so a transform could rename.
#[derive(Debug)]
pub struct PathTransform {
    excluded: GlobSet,
    included: Option<GlobSet>,
}

impl PathTransform {
    pub fn new(excluded_globs: &[String], included_globs: &[String]) -> Result<Self> {
        Ok(Self {
            excluded: build_glob_set(excluded_globs)?,
            included: if included_globs.is_empty() {
                None
            } else {
                Some(build_glob_set(included_globs)?)
            },
        })
    }

    /// A transform that admits every entry unchanged.
    pub fn identity() -> Self {
        Self {
            excluded: GlobSet::empty(),
            included: None,
        }
    }

    /// Destination path for `path`, or `None` to drop the entry.
    pub fn apply(&self, path: &str) -> Option<String> {
        if self.excluded.is_match(path) {
            return None;
        }
        if let Some(included) = &self.included {
            if !included.is_match(path) {
                return None;
            }
        }
        Some(path.to_string())
    }
}
