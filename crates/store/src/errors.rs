use std::{io, path::PathBuf};
use thiserror::Error;

/// Failure while building a collection handle; the handle is never returned.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("cannot resolve collection path {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("collection file does not exist: {}", .0.display())]
    Missing(PathBuf),
    #[error("cannot create collection file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid collection content in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot serialize collection: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl StoreError {
    pub fn is_read(&self) -> bool { matches!(self, Self::Read(_)) }
    pub fn is_write(&self) -> bool { matches!(self, Self::Write(_)) }
}
