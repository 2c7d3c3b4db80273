use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::fal::FalClient;

/// Shared, read-only state for request handlers.
#[derive(Debug)]
pub struct AppState {
    /// `None` when no API key is configured; generation is refused.
    pub client: Option<FalClient>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(client: Option<FalClient>) -> Self {
        Self {
            client,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn api_key_configured(&self) -> bool {
        self.client.is_some()
    }
}
