//! Output path derivation and file creation.
//!
//! All outputs live next to the input file they were derived from:
//! `trace.json` -> `trace.lineage.txt`, `trace.ops.txt`, and
//! `analysis/trace.json.report.txt`.

use crate::utils::config::{ANALYSIS_DIR, FILTERED_INFIX};
use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Replace the last extension of `input` with `suffix`
///
/// **Public** - used for lineage and op stream outputs
///
/// # Example
/// `logs/idx.json` + `.lineage.txt` -> `logs/idx.lineage.txt`
pub fn sibling_with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", stem, suffix))
}

/// Path of a file inside the `<dir>/<subdir>/` folder next to `input`
///
/// The full input file name is kept so that several inputs from the same
/// directory never collide.
pub fn in_subdir(input: &Path, subdir: &str, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parent_dir(input).join(subdir).join(format!("{}{}", name, suffix))
}

/// Report path for an analyzed input
pub fn report_path(input: &Path, suffix: &str) -> PathBuf {
    in_subdir(input, ANALYSIS_DIR, suffix)
}

/// Output path for thread extraction, `<file>.filtered.<tag>...json`
pub fn filtered_path(input: &Path, out_dir: &str, tags: &[String]) -> PathBuf {
    let mut suffix = FILTERED_INFIX.to_string();
    for tag in tags {
        suffix.push('.');
        suffix.push_str(tag);
    }
    suffix.push_str(".json");
    in_subdir(input, out_dir, &suffix)
}

fn parent_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Validate the path, create parent directories and open for writing
///
/// **Public** - shared by all writers
///
/// # Errors
/// * `OutputError::InvalidPath` - Empty path, directory, or uncreatable parent
/// * `OutputError::WriteFailed` - File cannot be created
pub fn create_output(output_path: &Path) -> Result<BufWriter<File>, OutputError> {
    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    Ok(BufWriter::new(file))
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_with_suffix() {
        assert_eq!(
            sibling_with_suffix(Path::new("logs/idx.json"), ".lineage.txt"),
            PathBuf::from("logs/idx.lineage.txt")
        );
        assert_eq!(
            sibling_with_suffix(Path::new("idx"), ".ops.txt"),
            PathBuf::from("idx.ops.txt")
        );
    }

    #[test]
    fn test_report_path() {
        assert_eq!(
            report_path(Path::new("logs/idx.json"), ".report.txt"),
            PathBuf::from("logs/analysis/idx.json.report.txt")
        );
        assert_eq!(
            report_path(Path::new("idx.json"), ".report.txt"),
            PathBuf::from("./analysis/idx.json.report.txt")
        );
    }

    #[test]
    fn test_filtered_path() {
        let tags = vec!["nc1.7".to_string()];
        assert_eq!(
            filtered_path(Path::new("logs/trace.log"), "analysis/storage", &tags),
            PathBuf::from("logs/analysis/storage/trace.log.filtered.nc1.7.json")
        );
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_create_output_makes_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("nested/dirs/out.txt");

        drop(create_output(&nested).unwrap());
        assert!(nested.exists());
    }
}
