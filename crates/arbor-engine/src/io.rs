use std::fs;
use std::path::{Path, PathBuf};

use crate::node::Node;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read the top-level blocks of a document saved in the persisted JSON layout
pub fn read_document(path: &Path) -> Result<Vec<Node>, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write top-level blocks as pretty-printed JSON, creating parent directories
pub fn write_document(path: &Path, children: &[Node]) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(children).map_err(|source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content + "\n")?;
    Ok(())
}
