//! Versioned JSON state files.
//!
//! Every state file is written atomically (temp file in the same directory,
//! then rename) so readers never observe a torn write. Loads are tolerant:
//! a file that fails to parse is quarantined to a timestamped `.corrupted`
//! backup and replaced by the default state, never a hard failure.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Errors from the strict state loader. Most callers want the tolerant
/// [`load_state`] / [`load_versioned`] wrappers instead.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("cannot read state file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state file {path} does not parse")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// Serialize and atomically write a state value as pretty JSON.
pub fn save_state<T: Serialize>(path: &Path, state: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    write_atomic(path, json.as_bytes())
}

/// Strict load: missing file is `Ok(None)`, unreadable or unparseable
/// files are errors.
pub fn try_load_state<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StateError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| StateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let state = serde_json::from_str(&content).map_err(|source| StateError::Corrupted {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(state))
}

/// Tolerant load: missing file yields the default state; a corrupted file
/// is renamed to `<name>.<unix-ts>.corrupted` and also yields the default.
pub fn load_state<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    match try_load_state(path) {
        Ok(Some(state)) => Ok(state),
        Ok(None) => Ok(T::default()),
        Err(StateError::Corrupted { .. }) => {
            quarantine(path)?;
            Ok(T::default())
        }
        Err(StateError::Io { source, .. }) => Err(source.into()),
    }
}

/// Tolerant load with forward migration. The raw JSON value's `version`
/// field is compared against `current`; older envelopes are passed to
/// `migrate(found_version, &mut value)` before deserialization. A value
/// that still fails to deserialize after migration is quarantined.
pub fn load_versioned<T>(
    path: &Path,
    current: u32,
    migrate: impl Fn(u64, &mut serde_json::Value),
) -> anyhow::Result<T>
where
    T: DeserializeOwned + Default,
{
    let value: Option<serde_json::Value> = match try_load_state(path) {
        Ok(v) => v,
        Err(StateError::Corrupted { .. }) => {
            quarantine(path)?;
            None
        }
        Err(StateError::Io { source, .. }) => return Err(source.into()),
    };
    let Some(mut value) = value else {
        return Ok(T::default());
    };

    let found = value.get("version").and_then(|v| v.as_u64()).unwrap_or(0);
    if found < u64::from(current) {
        migrate(found, &mut value);
        if let Some(obj) = value.as_object_mut() {
            obj.insert("version".to_string(), serde_json::json!(current));
        }
    }

    match serde_json::from_value(value) {
        Ok(state) => Ok(state),
        Err(_) => {
            quarantine(path)?;
            Ok(T::default())
        }
    }
}

/// Rename a corrupted state file to `<name>.<unix-ts>.corrupted`.
fn quarantine(path: &Path) -> anyhow::Result<()> {
    let ts = time::OffsetDateTime::now_utc().unix_timestamp();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "state".to_string());
    let backup = path.with_file_name(format!("{name}.{ts}.corrupted"));
    fs::rename(path, &backup)?;
    tracing::warn!(
        path = %path.display(),
        backup = %backup.display(),
        "quarantined corrupted state file"
    );
    Ok(())
}
