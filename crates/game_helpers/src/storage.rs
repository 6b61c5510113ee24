//! Single-value persistent storage.
//!
//! Browser `localStorage` on wasm, a dotfile in the user's home directory on
//! native. Values are stored as plain decimal strings under a caller-chosen
//! key.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("persistent storage is unavailable")]
    Unavailable,
    #[error("stored value is not an integer: {0:?}")]
    Malformed(String),
    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .and_then(|window| window.local_storage().ok())
        .flatten()
        .ok_or(StorageError::Unavailable)
}

#[cfg(target_arch = "wasm32")]
pub fn load_u32(key: &str) -> Result<Option<u32>, StorageError> {
    let storage = local_storage()?;
    let Some(raw) = storage
        .get_item(key)
        .map_err(|_| StorageError::Unavailable)?
    else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| StorageError::Malformed(raw))
}

#[cfg(target_arch = "wasm32")]
pub fn store_u32(key: &str, value: u32) -> Result<(), StorageError> {
    let storage = local_storage()?;
    storage
        .set_item(key, &value.to_string())
        .map_err(|_| StorageError::Unavailable)
}

#[cfg(not(target_arch = "wasm32"))]
fn path_for(key: &str) -> std::path::PathBuf {
    let base = std::env::var_os("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    base.join(format!(".{key}"))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_u32(key: &str) -> Result<Option<u32>, StorageError> {
    let path = path_for(key);
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| StorageError::Malformed(raw.trim().to_owned()))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn store_u32(key: &str, value: u32) -> Result<(), StorageError> {
    Ok(std::fs::write(path_for(key), value.to_string())?)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn scratch_key() -> String {
        format!("game_helpers_storage_test_{}", std::process::id())
    }

    #[test]
    fn missing_key_loads_as_none() {
        let loaded = load_u32("game_helpers_storage_test_never_written");
        assert!(matches!(loaded, Ok(None)), "expected no stored value");
    }

    #[test]
    fn round_trips_a_value() {
        let key = scratch_key();
        store_u32(&key, 4200).expect("store should succeed");
        let loaded = load_u32(&key).expect("load should succeed");
        let _ = std::fs::remove_file(path_for(&key));
        assert_eq!(loaded, Some(4200), "loaded value should match stored");
    }

    #[test]
    fn malformed_contents_are_reported() {
        let key = format!("{}_malformed", scratch_key());
        std::fs::write(path_for(&key), "not-a-number").expect("write scratch file");
        let loaded = load_u32(&key);
        let _ = std::fs::remove_file(path_for(&key));
        assert!(
            matches!(loaded, Err(StorageError::Malformed(_))),
            "expected a malformed-value error"
        );
    }
}
