use async_trait::async_trait;
use gatecore::{
    error::BackendError,
    snapshot::Snapshot,
    traits::StateBackend,
};
use std::{
    io::ErrorKind,
    path::{
        Path,
        PathBuf,
    },
};

/// Persists the engine state as a single JSON document.
///
/// Saving writes to a sibling temporary file which then replaces the
/// target, so an interrupted save leaves the previous state intact.
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateBackend for JsonFileBackend {
    async fn load(&self) -> Result<Option<Snapshot>, BackendError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no state found at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_slice(&bytes)?;
        log::debug!("loaded state from {}", self.path.display());
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), BackendError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        log::debug!("saved state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn temp_path() {
        let backend = JsonFileBackend::new("/var/lib/gateac/state.json");
        assert_eq!(backend.temp_path(), PathBuf::from("/var/lib/gateac/state.json.tmp"));
    }
}
