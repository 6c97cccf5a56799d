//! Ninja depfile emission
//!
//! A depfile tells the build graph which inputs an already-declared output
//! consumed, so the action re-runs when any of them changes:
//!
//! ```text
//! path/to/out.aar: classes.jar res.zip lib/R.txt
//! ```
//!
//! Ninja supports exactly one output per depfile. Spaces in paths are
//! escaped with a backslash; inputs keep their given order.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

fn escape(path: &Path) -> String {
    path.to_string_lossy().replace(' ', "\\ ")
}

/// Write `output: inputs...` to `depfile_path`, creating its parent
/// directory when missing.
pub fn write_depfile<P: AsRef<Path>>(
    depfile_path: &Path,
    output: &Path,
    inputs: &[P],
) -> Result<()> {
    if let Some(parent) = depfile_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut line = escape(output);
    line.push_str(": ");
    let escaped: Vec<String> = inputs.iter().map(|p| escape(p.as_ref())).collect();
    line.push_str(&escaped.join(" "));
    line.push('\n');
    fs::write(depfile_path, &line)?;
    debug!(
        "wrote depfile {} ({} inputs)",
        depfile_path.display(),
        inputs.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_depfile_format() {
        let dir = tempfile::tempdir().unwrap();
        let depfile = dir.path().join("out.d");
        let inputs = [PathBuf::from("a.jar"), PathBuf::from("res/values.zip")];
        write_depfile(&depfile, Path::new("out.aar"), &inputs).unwrap();
        assert_eq!(
            fs::read_to_string(&depfile).unwrap(),
            "out.aar: a.jar res/values.zip\n"
        );
    }

    #[test]
    fn test_spaces_are_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let depfile = dir.path().join("out.d");
        let inputs = [PathBuf::from("my lib.jar")];
        write_depfile(&depfile, Path::new("out dir/out.aar"), &inputs).unwrap();
        assert_eq!(
            fs::read_to_string(&depfile).unwrap(),
            "out\\ dir/out.aar: my\\ lib.jar\n"
        );
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let depfile = dir.path().join("nested/deps/out.d");
        write_depfile(&depfile, Path::new("out.aar"), &[PathBuf::from("a")]).unwrap();
        assert!(depfile.exists());
    }

    #[test]
    fn test_empty_inputs_still_name_the_output() {
        let dir = tempfile::tempdir().unwrap();
        let depfile = dir.path().join("out.d");
        write_depfile::<PathBuf>(&depfile, Path::new("out.aar"), &[]).unwrap();
        assert_eq!(fs::read_to_string(&depfile).unwrap(), "out.aar: \n");
    }
}
