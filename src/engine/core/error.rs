use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Source root could not be scanned. Fatal for a run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("source folder does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("source path is not a folder: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read source folder {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Output directory for a job could not be created. Fatal only for that file.
#[derive(Debug, Error)]
#[error("cannot create output folder {}: {source}", .path.display())]
pub struct FilesystemError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}
