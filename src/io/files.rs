//! Pre-flight checks on caller-supplied paths. There is no point invoking
//! the optimiser if the inputs do not exist or the results cannot be written.

use std::fs;
use std::path::{Path, PathBuf};

use super::IoError;

const EXCEL_EXTENSIONS: [&str; 2] = ["xls", "xlsx"];

/// Check that `path` names an existing Excel workbook.
pub fn validate_excel_input(path: impl AsRef<Path>) -> Result<PathBuf, IoError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(IoError::InputFileMissing(path.to_path_buf()));
    }
    let extension_ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXCEL_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !extension_ok {
        return Err(IoError::InvalidFileType {
            path: path.to_path_buf(),
            expected: ".xls or .xlsx",
        });
    }
    Ok(path.to_path_buf())
}

/// Make sure the parent directory of the results path exists, creating it if
/// needed.
pub fn prepare_output_path(path: impl AsRef<Path>) -> Result<PathBuf, IoError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if parent.exists() && !parent.is_dir() {
            return Err(IoError::OutputPath {
                path: path.to_path_buf(),
                reason: format!("parent {} exists and is not a directory", parent.display()),
            });
        }
        fs::create_dir_all(parent).map_err(|e| IoError::OutputPath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn accepts_existing_workbooks_of_either_extension() {
        let dir = tempdir().unwrap();
        for name in ["input.xlsx", "input.xls", "INPUT.XLSX"] {
            let path = dir.path().join(name);
            File::create(&path).unwrap();
            assert_eq!(validate_excel_input(&path).unwrap(), path);
        }
    }

    #[test]
    fn missing_input_is_reported_as_such() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.xlsx");
        let err = validate_excel_input(&path).unwrap_err();
        assert!(matches!(err, IoError::InputFileMissing(_)), "{err}");
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.csv");
        File::create(&path).unwrap();
        let err = validate_excel_input(&path).unwrap_err();
        assert!(matches!(err, IoError::InvalidFileType { .. }), "{err}");
    }

    #[test]
    fn output_parent_directories_are_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/results.csv");
        let prepared = prepare_output_path(&path).unwrap();
        assert_eq!(prepared, path);
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn output_parent_that_is_a_file_is_rejected() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        File::create(&blocker).unwrap();
        let err = prepare_output_path(blocker.join("results.csv")).unwrap_err();
        assert!(matches!(err, IoError::OutputPath { .. }), "{err}");
    }
}
