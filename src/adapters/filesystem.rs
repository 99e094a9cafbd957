// src/adapters/filesystem.rs
// Real file system adapter implementation

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ports::filesystem::{FileSystem, FileSystemError, LogWriter};

/// Real file system implementation
pub struct RealFileSystem;

fn map_io_error(path: &Path, e: io::Error) -> FileSystemError {
    match e.kind() {
        io::ErrorKind::NotFound => FileSystemError::PathNotFound(path.to_string_lossy().to_string()),
        io::ErrorKind::PermissionDenied => {
            FileSystemError::PermissionDenied(path.to_string_lossy().to_string())
        }
        _ => FileSystemError::IoError(e),
    }
}

impl FileSystem for RealFileSystem {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        fs::read(path).map_err(|e| map_io_error(path, e))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileSystemError> {
        fs::write(path, contents).map_err(|e| map_io_error(path, e))
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::create_dir_all(path).map_err(|e| map_io_error(path, e))
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let failed = e.path().unwrap_or(path).to_path_buf();
                match e.into_io_error() {
                    Some(io_err) => map_io_error(&failed, io_err),
                    None => FileSystemError::PathNotFound(failed.to_string_lossy().to_string()),
                }
            })?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }

        Ok(paths)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        fs::rename(from, to).map_err(|e| map_io_error(from, e))
    }

    fn open_append(&self, path: &Path) -> Result<LogWriter, FileSystemError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| map_io_error(path, e))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_path_exists() {
        let fs = RealFileSystem;

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("basin.g01");

        assert!(!fs.path_exists(&file_path));

        File::create(&file_path).unwrap();

        assert!(fs.path_exists(&file_path));
    }

    #[test]
    fn test_list_files_is_recursive() {
        let fs = RealFileSystem;

        let dir = tempdir().unwrap();
        let nested = dir.path().join("output");
        fs.create_dir_all(&nested).unwrap();

        let file1 = dir.path().join("basin.p01.tmp.hdf");
        let file2 = nested.join("basin.dss");
        fs.write_file(&file1, b"hdf").unwrap();
        fs.write_file(&file2, b"dss").unwrap();

        let paths = fs.list_files(dir.path()).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&file1));
        assert!(paths.contains(&file2));
    }

    #[test]
    fn test_write_truncates() {
        let fs = RealFileSystem;
        let dir = tempdir().unwrap();
        let path = dir.path().join("basin.b01");

        fs.write_file(&path, b"first version").unwrap();
        fs.write_file(&path, b"second").unwrap();

        assert_eq!(fs.read_file(&path).unwrap(), b"second");
    }

    #[test]
    fn test_open_append() {
        let fs = RealFileSystem;
        let dir = tempdir().unwrap();
        let path = dir.path().join("basin.log");

        for line in ["one", "two"] {
            let mut writer = fs.open_append(&path).unwrap();
            writeln!(writer, "{line}").unwrap();
        }

        assert_eq!(fs.read_file(&path).unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn test_read_missing_file() {
        let fs = RealFileSystem;
        let dir = tempdir().unwrap();

        let err = fs.read_file(&dir.path().join("missing.hdf")).unwrap_err();
        assert!(matches!(err, FileSystemError::PathNotFound(_)));
    }
}
