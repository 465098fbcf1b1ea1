//! Upload session: the dataset currently on display and the state of the
//! latest ingestion attempt.
//!
//! A failed upload never clears what is already shown; the previous dataset
//! stays in place until a new one is ready.

use std::path::Path;
use std::sync::Arc;

use crate::error::{DecodeError, IngestError, IngestResult};
use crate::logs::{log_error, log_info, log_success, LogCapture, LogEntry};
use crate::models::Dataset;
use crate::transform::{IngestReport, Ingestor};

#[derive(Debug, Clone, Default)]
pub enum IngestState {
    #[default]
    Idle,
    Parsing,
    Ready(IngestReport),
    Failed(String),
}

impl IngestState {
    pub fn is_parsing(&self) -> bool {
        matches!(self, IngestState::Parsing)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    state: IngestState,
    dataset: Option<Arc<Dataset>>,
    ingestor: Ingestor,
    messages: Vec<LogEntry>,
}

impl Session {
    pub fn new(ingestor: Ingestor) -> Self {
        Self {
            state: IngestState::Idle,
            dataset: None,
            ingestor,
            messages: Vec::new(),
        }
    }

    pub fn state(&self) -> &IngestState {
        &self.state
    }

    /// The dataset on display, shared with whoever renders it.
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.clone()
    }

    /// Messages logged during the latest ingestion attempt.
    pub fn messages(&self) -> &[LogEntry] {
        &self.messages
    }

    /// Ingest an upload. On failure the current dataset is kept.
    pub fn ingest_bytes(&mut self, name: &str, bytes: &[u8]) -> IngestResult<Arc<Dataset>> {
        let capture = LogCapture::start();
        let result = self.run_ingest(name, bytes);
        self.messages = capture.finish();
        result
    }

    fn run_ingest(&mut self, name: &str, bytes: &[u8]) -> IngestResult<Arc<Dataset>> {
        self.state = IngestState::Parsing;
        log_info("Processing file...");

        match self.ingestor.ingest_bytes(bytes) {
            Ok(mut outcome) => {
                outcome.report.file_name = Some(name.to_string());
                let dataset = Arc::new(outcome.dataset);
                self.dataset = Some(Arc::clone(&dataset));
                self.state = IngestState::Ready(outcome.report);
                log_success(format!("Visualizing data from {}", name));
                Ok(dataset)
            }
            Err(e) => {
                log_error(e.to_string());
                self.state = IngestState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Read a file from disk and ingest it.
    pub async fn ingest_file(&mut self, path: impl AsRef<Path>) -> IngestResult<Arc<Dataset>> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.csv")
            .to_string();

        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                let err = IngestError::from(DecodeError::Io(e));
                let capture = LogCapture::start();
                log_error(err.to_string());
                self.messages = capture.finish();
                self.state = IngestState::Failed(err.to_string());
                return Err(err);
            }
        };

        self.ingest_bytes(&name, &bytes)
    }
}
