//! Mapping of backend payloads into view models.
//!
//! Everything here is a pure function over its input. The only
//! non-deterministic value produced is the client timestamp stamped on
//! generated documents.

use std::collections::HashMap;

use tracing::debug;

use crate::contract::{FileAnalysis, SectionResult, SectionStatus, TreeNode, TreeRoot};
use crate::models::{DocKind, FileKind, FileNode, GeneratedDoc};

/// Map the backend tree into `FileNode`s, merging per-path analysis.
///
/// The root itself is not emitted; its children become the top level.
/// Folders recurse, files never get children.
pub fn transform_file_tree(
    tree: &TreeRoot,
    analysis_by_path: &HashMap<String, FileAnalysis>,
) -> Vec<FileNode> {
    tree.children
        .iter()
        .map(|node| map_node(node, analysis_by_path))
        .collect()
}

fn map_node(node: &TreeNode, analysis_by_path: &HashMap<String, FileAnalysis>) -> FileNode {
    let analysis = analysis_by_path.get(node.path());
    let content = analysis.and_then(|a| a.content.clone()).filter(|c| !c.is_empty());
    let language = analysis.and_then(|a| a.language.clone());

    match node {
        TreeNode::Dir {
            name,
            path,
            children,
        } => FileNode {
            id: path.clone(),
            name: name.clone(),
            kind: FileKind::Folder,
            path: path.clone(),
            content,
            language,
            children: Some(
                children
                    .iter()
                    .map(|child| map_node(child, analysis_by_path))
                    .collect(),
            ),
        },
        TreeNode::File { name, path, .. } => FileNode {
            id: path.clone(),
            name: name.clone(),
            kind: FileKind::File,
            path: path.clone(),
            content,
            language,
            children: None,
        },
    }
}

/// Keep the sections that succeeded with a non-empty body.
pub fn transform_generated_docs(results: &[SectionResult]) -> Vec<GeneratedDoc> {
    let now = chrono::Utc::now().timestamp_millis();
    let docs: Vec<GeneratedDoc> = results
        .iter()
        .filter(|r| r.status == SectionStatus::Success)
        .filter_map(|r| {
            let markdown = r.markdown_content.as_deref().filter(|md| !md.is_empty())?;
            Some(GeneratedDoc {
                id: r.section_name.clone(),
                file_id: r.section_name.clone(),
                markdown: markdown.to_string(),
                kind: DocKind::Generated,
                last_updated: now,
            })
        })
        .collect();
    debug!(
        sections = results.len(),
        kept = docs.len(),
        "Transformed generated sections"
    );
    docs
}

/// Case-insensitive search over file names.
///
/// Matching files are kept; folders survive only with the subset of
/// descendants that match. An empty query returns the tree unchanged.
pub fn filter_files(nodes: &[FileNode], query: &str) -> Vec<FileNode> {
    if query.is_empty() {
        return nodes.to_vec();
    }
    let needle = query.to_lowercase();
    filter_with(nodes, &needle)
}

fn filter_with(nodes: &[FileNode], needle: &str) -> Vec<FileNode> {
    nodes
        .iter()
        .filter_map(|node| match node.kind {
            FileKind::File if node.name.to_lowercase().contains(needle) => Some(node.clone()),
            FileKind::File => None,
            FileKind::Folder => {
                let children = filter_with(node.children.as_deref().unwrap_or_default(), needle);
                (!children.is_empty()).then(|| FileNode {
                    children: Some(children),
                    ..node.clone()
                })
            }
        })
        .collect()
}

/// Depth-first lookup by node id.
pub fn find_node<'a>(nodes: &'a [FileNode], id: &str) -> Option<&'a FileNode> {
    nodes.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            node.children
                .as_deref()
                .and_then(|children| find_node(children, id))
        }
    })
}

/// Wrap a source file as a viewable document: its content in a fenced
/// block tagged with the file language.
pub fn code_doc(file: &FileNode) -> Option<GeneratedDoc> {
    let content = file.content.as_deref()?;
    if file.is_folder() {
        return None;
    }
    let language = file.language.as_deref().unwrap_or_default();
    Some(GeneratedDoc {
        id: file.id.clone(),
        file_id: file.id.clone(),
        markdown: format!("```{language}\n{content}\n```"),
        kind: DocKind::Code,
        last_updated: chrono::Utc::now().timestamp_millis(),
    })
}
