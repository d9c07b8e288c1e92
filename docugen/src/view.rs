//! Plain-text rendering of workspace state for the terminal.

use docugen_core::models::{AnalysisStatus, AnalysisStep, FileNode, SectionSummary};

const BAR_WIDTH: usize = 20;

/// Indented tree listing, folders suffixed with `/`.
pub fn render_tree(nodes: &[FileNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        push_node(&mut out, node, 0);
    }
    out
}

fn push_node(out: &mut String, node: &FileNode, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&node.name);
    if node.is_folder() {
        out.push('/');
    }
    out.push('\n');
    for child in node.children.iter().flatten() {
        push_node(out, child, depth + 1);
    }
}

/// One status line, e.g. `[#######.............]  35% Processing Repository...`.
pub fn render_status(status: &AnalysisStatus) -> String {
    if status.step == AnalysisStep::Error {
        return format!("error: {}", status.message);
    }
    let filled = usize::from(status.progress) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        status.progress,
        status.message
    )
}

pub fn render_summary(summary: &SectionSummary) -> String {
    format!(
        "{} sections: {} processed, {} skipped, {} failed",
        summary.total, summary.processed, summary.skipped, summary.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docugen_core::models::FileKind;

    fn node(name: &str, kind: FileKind, children: Option<Vec<FileNode>>) -> FileNode {
        FileNode {
            id: name.to_string(),
            name: name.to_string(),
            kind,
            path: name.to_string(),
            content: None,
            language: None,
            children,
        }
    }

    #[test]
    fn tree_is_indented_by_depth() {
        let tree = vec![
            node(
                "src",
                FileKind::Folder,
                Some(vec![node("main.rs", FileKind::File, None)]),
            ),
            node("README.md", FileKind::File, None),
        ];
        assert_eq!(render_tree(&tree), "src/\n  main.rs\nREADME.md\n");
    }

    #[test]
    fn status_line_shows_bar_and_message() {
        let status = AnalysisStatus::new(AnalysisStep::Analyzing, "Processing Repository...", 35);
        assert_eq!(
            render_status(&status),
            "[#######.............]  35% Processing Repository..."
        );
        assert_eq!(
            render_status(&AnalysisStatus::error("Connection Lost")),
            "error: Connection Lost"
        );
    }
}
