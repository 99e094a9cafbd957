// src/ports/filesystem.rs
// File system port (interface)

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during file system operations
#[derive(Error, Debug)]
pub enum FileSystemError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Append-only handle to a log file
pub type LogWriter = Box<dyn Write + Send>;

/// Port for file system operations
pub trait FileSystem {
    /// Read a file's raw bytes
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileSystemError>;

    /// Create or truncate a file and write `contents` to it
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileSystemError>;

    /// Check if a path exists
    fn path_exists(&self, path: &Path) -> bool;

    /// Create a directory and all of its parents
    fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError>;

    /// List every regular file below a directory, recursively
    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError>;

    /// Rename a file
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FileSystemError>;

    /// Open a file for appending, creating it if needed
    fn open_append(&self, path: &Path) -> Result<LogWriter, FileSystemError>;
}

// Implement FileSystem for references to implement FileSystem
impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        (*self).read_file(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileSystemError> {
        (*self).write_file(path, contents)
    }

    fn path_exists(&self, path: &Path) -> bool {
        (*self).path_exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        (*self).create_dir_all(path)
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
        (*self).list_files(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        (*self).rename(from, to)
    }

    fn open_append(&self, path: &Path) -> Result<LogWriter, FileSystemError> {
        (*self).open_append(path)
    }
}
