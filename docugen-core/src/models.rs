//! View models produced from backend payloads and consumed by front ends.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    File,
    Folder,
}

/// One file or folder of the analyzed repository.
///
/// Only folders carry `children`; a file always has `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    /// Same as `path`.
    pub id: String,
    pub name: String,
    pub kind: FileKind,
    pub path: String,
    pub content: Option<String>,
    pub language: Option<String>,
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Overview,
    Api,
    Code,
    Architecture,
    Generated,
}

/// One documentation artifact held in the workspace cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDoc {
    pub id: String,
    /// Source file or section this document describes.
    pub file_id: String,
    pub markdown: String,
    pub kind: DocKind,
    /// Milliseconds since the Unix epoch, taken on the client.
    pub last_updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStep {
    Idle,
    Scanning,
    Analyzing,
    Complete,
    Error,
}

/// Client-side view of an analysis in flight.
///
/// `progress` is synthesized by the poller and carries no server meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisStatus {
    pub step: AnalysisStep,
    pub message: String,
    pub progress: u8,
}

impl AnalysisStatus {
    pub fn idle() -> Self {
        Self::new(AnalysisStep::Idle, "", 0)
    }

    pub fn new(step: AnalysisStep, message: impl Into<String>, progress: u8) -> Self {
        Self {
            step,
            message: message.into(),
            progress: progress.min(100),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(AnalysisStep::Error, message, 0)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.step, AnalysisStep::Complete | AnalysisStep::Error)
    }

    /// True while a submission is being processed.
    pub fn is_busy(&self) -> bool {
        matches!(self.step, AnalysisStep::Scanning | AnalysisStep::Analyzing)
    }
}

impl Default for AnalysisStatus {
    fn default() -> Self {
        Self::idle()
    }
}

/// Counters the backend reports alongside the generated sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub total: u32,
    pub processed: u32,
    pub skipped: u32,
    pub failed: u32,
}
