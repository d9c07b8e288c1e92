//! Session-scoped document cache.
//!
//! A [`Workspace`] is created once per front-end session and owns the file
//! tree and documents produced by finished analyses until [`Workspace::reset`]
//! ("back to input") clears it.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::models::{AnalysisStatus, AnalysisStep, DocKind, FileNode, GeneratedDoc};
use crate::polling::AnalysisOutcome;
use crate::transform::{code_doc, filter_files, find_node};

/// Sections the backend always tries to generate, in display order.
pub const FIXED_SECTIONS: [&str; 3] = ["Project Overview", "Getting Started", "Architecture"];

/// Shortcuts to the fixed sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialDoc {
    Overview,
    GettingStarted,
    Architecture,
}

impl SpecialDoc {
    pub fn section_name(self) -> &'static str {
        match self {
            SpecialDoc::Overview => "Project Overview",
            SpecialDoc::GettingStarted => "Getting Started",
            SpecialDoc::Architecture => "Architecture",
        }
    }
}

#[derive(Debug, Default)]
pub struct Workspace {
    status: AnalysisStatus,
    files: Vec<FileNode>,
    docs: HashMap<String, GeneratedDoc>,
    selected: Option<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &AnalysisStatus {
        &self.status
    }

    pub fn set_status(&mut self, status: AnalysisStatus) {
        self.status = status;
    }

    pub fn files(&self) -> &[FileNode] {
        &self.files
    }

    /// The file tree narrowed to names matching `query`.
    pub fn search(&self, query: &str) -> Vec<FileNode> {
        filter_files(&self.files, query)
    }

    /// Store a finished analysis. A reported tree replaces the current one,
    /// even when empty. Documents are merged by id, replacing any earlier
    /// version; the first generated document becomes the selection.
    pub fn apply_outcome(&mut self, outcome: AnalysisOutcome) {
        info!(
            task_id = %outcome.task_id,
            files = outcome.files.as_ref().map_or(0, Vec::len),
            docs = outcome.docs.len(),
            "Applying analysis outcome to workspace"
        );
        if let Some(files) = outcome.files {
            self.files = files;
        }
        if let Some(first) = outcome.docs.first() {
            self.selected = Some(first.id.clone());
        }
        for doc in outcome.docs {
            self.docs.insert(doc.id.clone(), doc);
        }
        self.status = AnalysisStatus::new(AnalysisStep::Complete, "Processing Complete", 100);
    }

    pub fn doc(&self, id: &str) -> Option<&GeneratedDoc> {
        self.docs.get(id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn current_doc(&self) -> Option<&GeneratedDoc> {
        self.selected.as_deref().and_then(|id| self.docs.get(id))
    }

    /// Select a node of the tree. Folders are ignored. A file with content
    /// gets a code document cached under its id.
    pub fn select_file(&mut self, id: &str) -> Option<&GeneratedDoc> {
        let node = find_node(&self.files, id)?;
        if node.is_folder() {
            return None;
        }
        let wrapped = code_doc(node);
        self.selected = Some(id.to_string());
        if let Some(doc) = wrapped {
            debug!(file = %id, "Caching source file as code document");
            self.docs.insert(doc.id.clone(), doc);
        }
        self.docs.get(id)
    }

    pub fn select_special(&mut self, which: SpecialDoc) -> Option<&GeneratedDoc> {
        let id = which.section_name();
        self.selected = Some(id.to_string());
        self.docs.get(id)
    }

    pub fn select_doc(&mut self, id: &str) -> Option<&GeneratedDoc> {
        self.selected = Some(id.to_string());
        self.docs.get(id)
    }

    /// Generated documents only (no wrapped source files): fixed sections
    /// first in their display order, then the rest by id.
    pub fn generated_docs(&self) -> Vec<&GeneratedDoc> {
        let mut fixed: Vec<&GeneratedDoc> = FIXED_SECTIONS
            .iter()
            .filter_map(|id| self.docs.get(*id))
            .filter(|d| d.kind == DocKind::Generated)
            .collect();
        let mut rest: Vec<&GeneratedDoc> = self
            .docs
            .values()
            .filter(|d| d.kind == DocKind::Generated && !FIXED_SECTIONS.contains(&d.id.as_str()))
            .collect();
        rest.sort_by(|a, b| a.id.cmp(&b.id));
        fixed.extend(rest);
        fixed
    }

    /// Write every generated document to `dir` as `<id>.md`. Ids that
    /// sanitize to the same name get a `-2`, `-3`, ... suffix in export order.
    pub fn export_generated(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        let docs = self.generated_docs();
        if docs.is_empty() {
            return Err(ExportError::NothingToExport);
        }
        fs::create_dir_all(dir)?;
        let mut taken = HashSet::with_capacity(docs.len());
        let mut written = Vec::with_capacity(docs.len());
        for doc in docs {
            let name = unique_file_name(&doc.id, &mut taken);
            let path = dir.join(name);
            fs::write(&path, &doc.markdown)?;
            debug!(path = %path.display(), "Exported document");
            written.push(path);
        }
        info!(count = written.len(), dir = %dir.display(), "Exported generated documentation");
        Ok(written)
    }

    /// Back to input: drop every cached artifact and return to idle.
    pub fn reset(&mut self) {
        self.files.clear();
        self.docs.clear();
        self.selected = None;
        self.status = AnalysisStatus::idle();
    }
}

fn unique_file_name(id: &str, taken: &mut HashSet<String>) -> String {
    let base = export_file_name(id);
    let mut name = base.clone();
    let mut n = 2;
    while !taken.insert(name.clone()) {
        let stem = base.strip_suffix(".md").unwrap_or(&base);
        warn!(id = %id, file = %base, "Export file name collision, adding suffix");
        name = format!("{stem}-{n}.md");
        n += 1;
    }
    name
}

/// File name for a document id; ids may contain path separators.
pub fn export_file_name(id: &str) -> String {
    let mut name: String = id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    if !name.ends_with(".md") {
        name.push_str(".md");
    }
    name
}
