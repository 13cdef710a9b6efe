use std::path::PathBuf;

/// Hook invoked with the raw body of every successful provider response.
///
/// Purely diagnostic: implementations must not fail the call they observe.
#[async_trait::async_trait]
pub trait ResponseObserver: Send + Sync {
    async fn observe(&self, operation: &str, body: &[u8]);
}

/// Writes each observed response to `<dir>/<operation>.json`, overwriting the
/// previous response for the same operation.
#[derive(Debug, Clone)]
pub struct FileDumpObserver {
    dir: PathBuf,
}

impl FileDumpObserver {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl ResponseObserver for FileDumpObserver {
    async fn observe(&self, operation: &str, body: &[u8]) {
        let path = self.dir.join(format!("{operation}.json"));
        if let Err(e) = tokio::fs::write(&path, body).await {
            tracing::warn!("Failed to dump {operation} response to {}: {e}", path.display());
        }
    }
}
