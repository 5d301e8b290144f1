//! Local document I/O for remote mode.
//!
//! Inputs are read whole. Outputs are written to a temp file in the target
//! directory and renamed into place once complete, so a failed or cancelled
//! operation never leaves a truncated document behind.

use crate::error::{Result, UnoError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a whole input document.
pub async fn read_input(path: &Path) -> Result<Vec<u8>> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| UnoError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Atomically write `data` to `path`, creating parent directories.
pub async fn write_output(path: &Path, data: Vec<u8>) -> Result<()> {
    let path = path.to_path_buf();
    let len = data.len();

    let target = path.clone();
    tokio::task::spawn_blocking(move || write_atomic(&target, &data))
        .await
        .map_err(|e| UnoError::WriteFailed {
            path: path.clone(),
            source: std::io::Error::other(e),
        })??;

    debug!("Wrote {} bytes to {}", len, path.display());
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| UnoError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".unoclient-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(write_err)?;
    tmp.write_all(data).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o660))
            .map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
