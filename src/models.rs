//! Data models and structures used throughout the application

use serde::{Deserialize, Serialize};

/// Result of a generation or revision call handed back to the webview
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub content: String,
}

/// Snapshot of the orchestration state for the webview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: String,
    pub has_sketch: bool,
    pub sketch: Option<String>,
    pub artifact: Option<String>,
    pub vibe: String,
}

/// Result of exporting the current artifact to disk
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub export_dir: String,
    pub files_written: Vec<String>,
}
