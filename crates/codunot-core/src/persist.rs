// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-inspectable JSON persistence with atomic replacement.
//!
//! Writes go to a temp file in the destination directory which is then
//! renamed over the target, so readers never observe a torn file.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CodunotError;

/// Read and deserialize a JSON file.
///
/// Returns `Ok(None)` when the file does not exist and
/// [`CodunotError::Persistence`] when it cannot be read or parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CodunotError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CodunotError::persistence(path, e)),
    };
    let value = serde_json::from_slice(&bytes).map_err(|e| CodunotError::persistence(path, e))?;
    Ok(Some(value))
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CodunotError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| CodunotError::persistence(path, e))?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| CodunotError::persistence(path, e))?;
    serde_json::to_writer_pretty(&mut tmp, value)
        .map_err(|e| CodunotError::persistence(path, e))?;
    tmp.write_all(b"\n")
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CodunotError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| CodunotError::persistence(path, e.error))?;

    debug!(path = %path.display(), "state written");
    Ok(())
}
