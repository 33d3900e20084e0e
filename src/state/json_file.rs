//! File-backed state store: one pretty-printed JSON document per key.

use super::StateStore;
use crate::error::BotError;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Write as _;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Persists each record as `<dir>/<encoded key>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    dir: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _record: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Keeps `[A-Za-z0-9_-]` and percent-encodes every other byte so any key
/// maps to a distinct, portable file name.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

#[async_trait]
impl<T> StateStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    async fn load(&self, key: &str) -> Result<T, BotError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                BotError::Store(format!("Failed to parse {}: {}", path.display(), e))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(err) => Err(BotError::Io(err)),
        }
    }

    async fn save(&self, key: &str, value: &T) -> Result<(), BotError> {
        let json = serde_json::to_string_pretty(value)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::trace!(
            target = "rambo::state",
            path = %path.display(),
            event = "state_saved"
        );
        Ok(())
    }
}
