//! # contract: backend schema and client interface
//!
//! This module defines the single trait ([`DocgenApi`]) through which the rest
//! of the crate talks to the documentation-generation backend, together with
//! the request and response shapes of that backend.
//!
//! ## Interface
//! - Implement [`DocgenApi`] for a transport (the CLI crate ships a `reqwest`
//!   client) or let `mockall` generate one for tests.
//! - All methods are async and return [`ApiError`]. Implementations never
//!   retry and never impose timeouts; the caller owns that policy.
//!
//! ## Payload shapes
//! Backend responses are decoded into explicit types at the boundary: task
//! state is an enum, tree nodes are keyed by their `type` field (anything
//! but `dir` reads as a file), section results carry a status enum with a
//! catch-all for unknown values.

use std::collections::HashMap;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Lifecycle of a server-side analysis task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    InProgress,
    Success,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failed)
    }
}

/// One failure reported by the backend for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /status/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub status: TaskState,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<TaskError>>,
}

impl TaskStatusResponse {
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .as_deref()
            .and_then(|errors| errors.first())
            .and_then(|e| e.error.as_deref())
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartProcessingResponse {
    pub task_id: String,
}

/// Outcome of generating one documentation section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Success,
    Failed,
    Skipped,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionResult {
    pub section_name: String,
    #[serde(default)]
    pub output_path: String,
    pub status: SectionStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub markdown_content: Option<String>,
}

/// A node of the analyzed repository tree as the backend reports it.
///
/// Only `"type": "dir"` makes a folder; any other or missing type decodes
/// as a file, and missing names or paths decode as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", from = "RawTreeNode")]
pub enum TreeNode {
    Dir {
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: String,
        is_binary: bool,
    },
}

#[derive(Deserialize)]
struct RawTreeNode {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    children: Option<Vec<TreeNode>>,
    #[serde(default)]
    is_binary: Option<bool>,
}

impl From<RawTreeNode> for TreeNode {
    fn from(raw: RawTreeNode) -> Self {
        let name = raw.name.unwrap_or_default();
        let path = raw.path.unwrap_or_default();
        if raw.kind.as_deref() == Some("dir") {
            TreeNode::Dir {
                name,
                path,
                children: raw.children.unwrap_or_default(),
            }
        } else {
            TreeNode::File {
                name,
                path,
                is_binary: raw.is_binary.unwrap_or_default(),
            }
        }
    }
}

impl TreeNode {
    pub fn path(&self) -> &str {
        match self {
            TreeNode::Dir { path, .. } | TreeNode::File { path, .. } => path,
        }
    }
}

/// Root of `file_tree`. The backend sends `{}` when nothing was analyzed, so
/// every field defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRoot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

/// Per-file analysis; only the fields the client shows are decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_binary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAnalysis {
    #[serde(default)]
    pub file_tree: Option<TreeRoot>,
    #[serde(default)]
    pub file_analysis: HashMap<String, FileAnalysis>,
}

/// Body of `GET /result/{task_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendProcessingResult {
    #[serde(default)]
    pub total_sections: u32,
    #[serde(default)]
    pub processed: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub results: Vec<SectionResult>,
    #[serde(default)]
    pub source_analysis: Option<SourceAnalysis>,
}

/// Registration form. The front end uses the email as username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyStatus {
    pub configured: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Debug, Deserialize)]
struct FieldError {
    #[serde(default)]
    msg: Option<String>,
}

/// Pulls the user-facing message out of an error body shaped like
/// `{"detail": "..."}` or `{"detail": [{"msg": "..."}]}`.
///
/// A field-error list whose first entry has no `msg` yields
/// `"Validation error"`; anything else yields `fallback`.
pub fn extract_error_message(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(ErrorPayload {
            detail: Some(ErrorDetail::Message(msg)),
        }) => msg,
        Ok(ErrorPayload {
            detail: Some(ErrorDetail::Fields(fields)),
        }) => match fields.into_iter().next() {
            Some(field) => field.msg.unwrap_or_else(|| "Validation error".to_string()),
            None => fallback.to_string(),
        },
        _ => fallback.to_string(),
    }
}

/// Client interface for the documentation-generation backend.
///
/// Every call is an independent request carrying the session credentials
/// established by [`DocgenApi::login`]. Implemented by the HTTP client and by
/// test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocgenApi: Send + Sync {
    /// Authenticate and establish the session cookie.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Create an account, then log in with it.
    async fn register(&self, account: &NewAccount) -> Result<(), ApiError>;

    /// Store the user's model API key on the backend.
    async fn save_api_key(&self, api_key: &str) -> Result<(), ApiError>;

    async fn get_api_key_status(&self) -> Result<ApiKeyStatus, ApiError>;

    /// Submit a repository for analysis; returns the server-assigned task id.
    async fn start_processing(&self, repo_url: &str) -> Result<String, ApiError>;

    async fn get_status(&self, task_id: &str) -> Result<TaskStatusResponse, ApiError>;

    async fn get_result(&self, task_id: &str) -> Result<BackendProcessingResult, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_response_decodes_screaming_case_states() {
        let body = json!({"task_id": "t1", "status": "IN_PROGRESS", "errors": []});
        let status: TaskStatusResponse = serde_json::from_value(body).unwrap();
        assert_eq!(status.status, TaskState::InProgress);
        assert_eq!(status.first_error(), None);
        assert!(!status.status.is_terminal());
    }

    #[test]
    fn first_error_reads_the_first_reported_failure() {
        let body = json!({
            "status": "FAILED",
            "errors": [
                {"file_path": "https://example.com/r", "error": "boom"},
                {"file_path": "a.py", "error": "second"}
            ]
        });
        let status: TaskStatusResponse = serde_json::from_value(body).unwrap();
        assert_eq!(status.first_error(), Some("boom"));
    }

    #[test]
    fn unknown_task_state_is_rejected_at_the_boundary() {
        let body = json!({"status": "EXPLODED"});
        assert!(serde_json::from_value::<TaskStatusResponse>(body).is_err());
    }

    #[test]
    fn result_tolerates_missing_fields_and_empty_tree() {
        let body = json!({
            "results": [{"section_name": "A", "status": "weird"}],
            "source_analysis": {"file_tree": {}, "file_analysis": {}}
        });
        let result: BackendProcessingResult = serde_json::from_value(body).unwrap();
        assert_eq!(result.total_sections, 0);
        assert_eq!(result.results[0].status, SectionStatus::Unknown);
        let tree = result.source_analysis.unwrap().file_tree.unwrap();
        assert!(tree.children.is_empty());
    }

    #[test]
    fn tree_nodes_are_tagged_by_type() {
        let body = json!({
            "name": "repo",
            "path": "/",
            "children": [
                {"name": "src", "path": "/src", "type": "dir", "children": [
                    {"name": "main.py", "path": "src/main.py", "type": "file", "is_binary": false}
                ]}
            ]
        });
        let root: TreeRoot = serde_json::from_value(body).unwrap();
        match &root.children[0] {
            TreeNode::Dir { children, .. } => assert_eq!(children[0].path(), "src/main.py"),
            other => panic!("expected dir, got {other:?}"),
        }
    }

    #[test]
    fn unknown_or_missing_node_types_decode_as_files() {
        let body = json!({
            "total_sections": 1,
            "processed": 1,
            "results": [{"section_name": "Architecture", "status": "success",
                         "markdown_content": "# Architecture"}],
            "source_analysis": {
                "file_tree": {"name": "repo", "path": "/", "children": [
                    {"name": "link", "path": "link", "type": "symlink"},
                    {"name": "notype", "path": "notype"},
                    {"name": "src", "path": "/src", "type": "dir", "children": null}
                ]},
                "file_analysis": {}
            }
        });
        let result: BackendProcessingResult =
            serde_json::from_value(body).expect("lenient tree decodes");
        let tree = result.source_analysis.unwrap().file_tree.unwrap();
        assert!(matches!(&tree.children[0], TreeNode::File { path, .. } if path == "link"));
        assert!(matches!(&tree.children[1], TreeNode::File { is_binary: false, .. }));
        assert!(matches!(&tree.children[2], TreeNode::Dir { children, .. } if children.is_empty()));
        assert_eq!(result.results.len(), 1);
    }

    #[test]
    fn null_task_error_detail_has_no_first_error() {
        let body = json!({"status": "FAILED", "errors": [{"error": null}]});
        let status: TaskStatusResponse = serde_json::from_value(body).expect("null error decodes");
        assert_eq!(status.status, TaskState::Failed);
        assert_eq!(status.first_error(), None);

        let body = json!({"status": "FAILED", "errors": [{"file_path": "a.py"}]});
        let status: TaskStatusResponse = serde_json::from_value(body).unwrap();
        assert_eq!(status.first_error(), None);
    }

    #[test]
    fn extract_error_message_handles_string_and_field_lists() {
        assert_eq!(
            extract_error_message(r#"{"detail": "Incorrect username or password"}"#, "Login failed"),
            "Incorrect username or password"
        );
        assert_eq!(
            extract_error_message(
                r#"{"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address"}]}"#,
                "Registration failed"
            ),
            "value is not a valid email address"
        );
        assert_eq!(
            extract_error_message(r#"{"detail": [{"loc": ["body"]}]}"#, "Registration failed"),
            "Validation error"
        );
        assert_eq!(extract_error_message(r#"{"detail": []}"#, "Login failed"), "Login failed");
        assert_eq!(extract_error_message("<html>502</html>", "Login failed"), "Login failed");
    }
}
