//! R.txt resource-id table merging and renumbering
//!
//! An R.txt file maps symbolic Android resource names to numeric ids, one
//! declaration per line:
//!
//! ```text
//! int attr title 0x7f010003
//! int string app_name 0x7f040000
//! int styleable Toolbar_titleText 2
//! int[] styleable Toolbar { 0x7f010001, 0x7f010002, 0x7f010003 }
//! ```
//!
//! Libraries number their resources independently, so merging several R.txt
//! files produces clashing ids. This module merges declaration sets and can
//! renumber the combined table into one consistent id space: scalar types get
//! dense ids per (javaType, resourceType) group, and `int[] styleable` arrays
//! are rebuilt from the renumbered `int attr` table, ordered by the original
//! attribute declaration index.
//!
//! Every iteration in this module follows one documented total order:
//! lexicographic byte order over (java_type, resource_type, name).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::filter::IncludeGlobs;

/// Resource ids live in the package-private 0x7fxx0000 range; the group's
/// type id is added to this base before shifting into the high half.
const PACKAGE_ID_BASE: u64 = 0x7f00;

/// A single R.txt declaration: `<javaType> <resourceType> <name> <value>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtxtRecord {
    /// Java-side carrier type, `int` or `int[]`.
    pub java_type: String,
    /// Resource category, e.g. `attr`, `id`, `string`, `styleable`.
    pub resource_type: String,
    /// Declared identifier.
    pub name: String,
    /// Hex/decimal id literal, or a brace-delimited id array.
    pub value: String,
}

impl RtxtRecord {
    /// Parse one declaration line.
    ///
    /// The value field may itself contain spaces (brace-delimited id
    /// arrays), so the line splits into at most four fields. Lines with
    /// fewer fields, or with empty fields, are malformed.
    pub fn parse(line: &str) -> Result<Self> {
        let mut fields = line.trim().splitn(4, ' ');
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(java_type), Some(resource_type), Some(name), Some(value))
                if !java_type.is_empty()
                    && !resource_type.is_empty()
                    && !name.is_empty()
                    && !value.is_empty() =>
            {
                Ok(Self {
                    java_type: java_type.to_string(),
                    resource_type: resource_type.to_string(),
                    name: name.to_string(),
                    value: value.to_string(),
                })
            }
            _ => Err(Error::RtxtParse(line.to_string())),
        }
    }
}

impl fmt::Display for RtxtRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.java_type, self.resource_type, self.name, self.value
        )
    }
}

/// Merged resource table keyed by (java_type, resource_type).
///
/// `BTreeMap` keys give every pass the documented total order for free, so
/// renumbering the same declarations always yields byte-identical output no
/// matter how the inputs were ordered.
#[derive(Debug, Default)]
pub struct RtxtTable {
    groups: BTreeMap<(String, String), BTreeMap<String, String>>,
}

impl RtxtTable {
    /// Build a table from declaration lines.
    ///
    /// Lines must be fed in sorted order when duplicate (type, name) keys
    /// with divergent values are possible: the last inserted value wins, and
    /// sorted insertion keeps that winner deterministic.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut table = Self::default();
        for line in lines {
            table.insert(RtxtRecord::parse(line)?);
        }
        Ok(table)
    }

    /// Insert one record, overwriting any previous value for its key.
    pub fn insert(&mut self, record: RtxtRecord) {
        self.groups
            .entry((record.java_type, record.resource_type))
            .or_default()
            .insert(record.name, record.value);
    }

    /// Number of declarations across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// True when the table holds no declarations.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Reassign every id in the table to one consistent id space.
    ///
    /// Each (java_type, resource_type) group is assigned a type id by its
    /// position in the sorted key list, starting at 1. Styleable groups
    /// (both `int` and `int[]`) consume a slot but keep their original
    /// values: `int styleable` entries are positional indices into their
    /// array, and `int[] styleable` arrays are rebuilt afterwards from the
    /// renumbered attr ids.
    pub fn renumber(&mut self) -> Result<()> {
        for (i, ((_, resource_type), members)) in self.groups.iter_mut().enumerate() {
            let tid = i as u64 + 1;
            if resource_type == "styleable" {
                continue;
            }
            for (index, value) in members.values_mut().enumerate() {
                *value = format_id(tid, index as u64);
            }
        }
        self.rebuild_styleable_arrays()
    }

    /// Rebuild every `int[] styleable` value from the attr table.
    ///
    /// The members of array `Foo` are the `int styleable` entries named
    /// `Foo_<attr>`; their original values are indices recording declaration
    /// order, which decides the order of the rebuilt array.
    fn rebuild_styleable_arrays(&mut self) -> Result<()> {
        let members: Vec<(String, i64)> = match self.group("int", "styleable") {
            Some(group) => group
                .iter()
                .map(|(name, value)| {
                    let index = parse_int_literal(value).ok_or_else(|| Error::RtxtValue {
                        name: name.clone(),
                        value: value.clone(),
                    })?;
                    Ok((name.clone(), index))
                })
                .collect::<Result<_>>()?,
            None => Vec::new(),
        };
        let attr_ids = self.group("int", "attr").cloned().unwrap_or_default();

        let Some(arrays) = self
            .groups
            .get_mut(&("int[]".to_string(), "styleable".to_string()))
        else {
            return Ok(());
        };

        for (name, value) in arrays.iter_mut() {
            let prefix = format!("{name}_");
            let mut attrs: Vec<(i64, &str)> = Vec::new();
            for (member, index) in &members {
                if let Some(local) = member.strip_prefix(prefix.as_str()) {
                    attrs.push((*index, local));
                }
            }
            attrs.sort_unstable();

            let mut ids = Vec::with_capacity(attrs.len());
            for (_, local) in attrs {
                let id = attr_ids
                    .get(local)
                    .ok_or_else(|| Error::UnresolvedStyleableAttr {
                        styleable: name.clone(),
                        attr: local.to_string(),
                    })?;
                ids.push(id.as_str());
            }
            *value = if ids.is_empty() {
                "{ }".to_string()
            } else {
                format!("{{ {} }}", ids.join(", "))
            };
        }
        Ok(())
    }

    fn group(&self, java_type: &str, resource_type: &str) -> Option<&BTreeMap<String, String>> {
        self.groups
            .get(&(java_type.to_string(), resource_type.to_string()))
    }
}

impl fmt::Display for RtxtTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ((java_type, resource_type), members) in &self.groups {
            for (name, value) in members {
                writeln!(f, "{java_type} {resource_type} {name} {value}")?;
            }
        }
        Ok(())
    }
}

fn format_id(tid: u64, index: u64) -> String {
    format!("{:#x}", (PACKAGE_ID_BASE + tid) << 16 | index)
}

/// Parse a decimal or `0x`-prefixed hexadecimal id literal.
fn parse_int_literal(value: &str) -> Option<i64> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Merge R.txt files into one deduplicated, optionally renumbered text.
///
/// Files not matched by `include` are skipped entirely. Merging is exact
/// line dedup: identical text across files collapses, divergent values for
/// the same logical name survive as distinct lines unless `renumber`
/// rebuilds the table. Output lines are sorted, one declaration per line.
pub fn merge_rtxt_files<P: AsRef<Path>>(
    paths: &[P],
    include: &IncludeGlobs,
    renumber: bool,
) -> Result<String> {
    let mut lines = BTreeSet::new();
    for path in paths {
        let path = path.as_ref();
        if !include.matches(path) {
            debug!("skipping {} (not matched by include globs)", path.display());
            continue;
        }
        let file = File::open(path)?;
        for line in BufReader::new(file).lines() {
            lines.insert(line?);
        }
    }
    debug!("merged {} distinct R.txt lines", lines.len());

    if renumber {
        let mut table = RtxtTable::from_lines(lines.iter().map(String::as_str))?;
        table.renumber()?;
        Ok(table.to_string())
    } else {
        let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in &lines {
            out.push_str(line);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_rtxt(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn renumbered(lines: &[&str]) -> RtxtTable {
        let mut sorted: Vec<&str> = lines.to_vec();
        sorted.sort_unstable();
        let mut table = RtxtTable::from_lines(sorted).unwrap();
        table.renumber().unwrap();
        table
    }

    #[test]
    fn test_parse_record() {
        let record = RtxtRecord::parse("int attr title 0x7f010003").unwrap();
        assert_eq!(record.java_type, "int");
        assert_eq!(record.resource_type, "attr");
        assert_eq!(record.name, "title");
        assert_eq!(record.value, "0x7f010003");

        let array = RtxtRecord::parse("int[] styleable Toolbar { 0x1, 0x2 }").unwrap();
        assert_eq!(array.java_type, "int[]");
        assert_eq!(array.value, "{ 0x1, 0x2 }");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(RtxtRecord::parse("").is_err());
        assert!(RtxtRecord::parse("int attr title").is_err());
        assert!(RtxtRecord::parse("int  attr title").is_err());
    }

    #[test]
    fn test_dedup_only_merge_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_rtxt(
            dir.path(),
            "a.txt",
            "int string app_name 0x7f040000\nint attr title 0x7f010000\n",
        );
        let b = write_rtxt(
            dir.path(),
            "b.txt",
            "int attr title 0x7f010000\nint attr subtitle 0x7f010001\n",
        );
        let include = IncludeGlobs::empty();

        let merged = merge_rtxt_files(&[&a, &b], &include, false).unwrap();
        assert_eq!(
            merged,
            "int attr subtitle 0x7f010001\nint attr title 0x7f010000\nint string app_name 0x7f040000\n"
        );

        let again = write_rtxt(dir.path(), "merged.txt", &merged);
        let remerged = merge_rtxt_files(&[&again], &include, false).unwrap();
        assert_eq!(remerged, merged);
    }

    #[test]
    fn test_include_globs_skip_whole_files() {
        let dir = tempfile::tempdir().unwrap();
        let kept = write_rtxt(dir.path(), "lib_keep.txt", "int attr a 0x1\n");
        let dropped = write_rtxt(dir.path(), "other.txt", "int attr b 0x2\n");
        let include = IncludeGlobs::new(&["*keep*".to_string()]).unwrap();

        let merged = merge_rtxt_files(&[&kept, &dropped], &include, false).unwrap();
        assert_eq!(merged, "int attr a 0x1\n");
    }

    #[test]
    fn test_renumber_is_deterministic_across_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_rtxt(
            dir.path(),
            "a.txt",
            "int attr title 0x7f010000\nint string app_name 0x7f040000\n",
        );
        let b = write_rtxt(
            dir.path(),
            "b.txt",
            "int string app_name 0x7f020000\nint id container 0x7f050000\n",
        );
        let include = IncludeGlobs::empty();

        let forward = merge_rtxt_files(&[&a, &b], &include, true).unwrap();
        let reverse = merge_rtxt_files(&[&b, &a], &include, true).unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_renumber_assigns_disjoint_dense_ranges() {
        let table = renumbered(&[
            "int attr alpha 0x11",
            "int attr beta 0x22",
            "int id container 0x33",
            "int string app_name 0x44",
            "int string subtitle 0x55",
        ]);
        let text = table.to_string();
        assert_eq!(
            text,
            "int attr alpha 0x7f010000\n\
             int attr beta 0x7f010001\n\
             int id container 0x7f020000\n\
             int string app_name 0x7f030000\n\
             int string subtitle 0x7f030001\n"
        );
    }

    #[test]
    fn test_renumber_collision_last_write_wins() {
        // Divergent values for one key: the lexicographically greatest
        // line wins because insertion follows sorted line order.
        let table = renumbered(&["int id dup 0x1", "int id dup 0x2"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.to_string(), "int id dup 0x7f010000\n");
    }

    #[test]
    fn test_styleable_resolution_preserves_declaration_order() {
        let table = renumbered(&[
            "int styleable Foo_bar 0x1",
            "int styleable Foo_baz 0x2",
            "int attr bar 0x7f019999",
            "int attr baz 0x7f018888",
            "int[] styleable Foo { 0x7f019999, 0x7f018888 }",
        ]);
        let text = table.to_string();
        // attr ids renumber alphabetically: bar first, then baz.
        assert!(text.contains("int attr bar 0x7f010000\n"));
        assert!(text.contains("int attr baz 0x7f010001\n"));
        // The array follows declaration order (Foo_bar at index 1 before
        // Foo_baz at index 2), not name order of the ids.
        assert!(text.contains("int[] styleable Foo { 0x7f010000, 0x7f010001 }\n"));
        // Positional indices pass through untouched.
        assert!(text.contains("int styleable Foo_bar 0x1\n"));
        assert!(text.contains("int styleable Foo_baz 0x2\n"));
    }

    #[test]
    fn test_styleable_declaration_order_beats_name_order() {
        // zebra declared before apple; the array must list zebra's id first.
        let table = renumbered(&[
            "int styleable Widget_zebra 0",
            "int styleable Widget_apple 1",
            "int attr apple 0x1",
            "int attr zebra 0x2",
            "int[] styleable Widget { 0x2, 0x1 }",
        ]);
        let text = table.to_string();
        assert!(text.contains("int attr apple 0x7f010000\n"));
        assert!(text.contains("int attr zebra 0x7f010001\n"));
        assert!(text.contains("int[] styleable Widget { 0x7f010001, 0x7f010000 }\n"));
    }

    #[test]
    fn test_styleable_without_members_is_empty_group() {
        let table = renumbered(&["int[] styleable Lonely { 0x1 }"]);
        assert_eq!(table.to_string(), "int[] styleable Lonely { }\n");
    }

    #[test]
    fn test_styleable_missing_attr_is_an_error() {
        let mut table = RtxtTable::from_lines([
            "int styleable Foo_bar 0",
            "int[] styleable Foo { 0x1 }",
        ])
        .unwrap();
        let err = table.renumber().unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedStyleableAttr { styleable, attr }
                if styleable == "Foo" && attr == "bar"
        ));
    }

    #[test]
    fn test_styleable_groups_still_consume_a_type_id() {
        // Groups sort as (int,attr)=1, (int,styleable)=2, (int,xml)=3.
        // The styleable group keeps its positional values but still takes
        // slot 2, pushing xml to tid 3.
        let table = renumbered(&[
            "int attr a 0x1",
            "int styleable S_a 0",
            "int[] styleable S { 0x1 }",
            "int xml config 0x9",
        ]);
        let text = table.to_string();
        assert!(text.contains("int attr a 0x7f010000\n"));
        assert!(text.contains("int xml config 0x7f030000\n"));
        assert!(text.contains("int[] styleable S { 0x7f010000 }\n"));
    }

    #[test]
    fn test_renumber_rejects_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_rtxt(dir.path(), "bad.txt", "int attr broken\n");
        let include = IncludeGlobs::empty();
        assert!(merge_rtxt_files(&[&bad], &include, true).is_err());
    }

    #[test]
    fn test_renumber_rejects_bad_styleable_index() {
        let mut table = RtxtTable::from_lines([
            "int attr bar 0x1",
            "int styleable Foo_bar notanumber",
            "int[] styleable Foo { 0x1 }",
        ])
        .unwrap();
        assert!(matches!(
            table.renumber().unwrap_err(),
            Error::RtxtValue { .. }
        ));
    }

    #[test]
    fn test_int_literal_forms() {
        assert_eq!(parse_int_literal("7"), Some(7));
        assert_eq!(parse_int_literal("0x10"), Some(16));
        assert_eq!(parse_int_literal("0X10"), Some(16));
        assert_eq!(parse_int_literal("zzz"), None);
    }
}
