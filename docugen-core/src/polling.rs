//! Task polling: drives one analysis from submission to a terminal state.
//!
//! [`Poller::submit`] validates the URL, then spawns a single task that
//! starts processing on the backend and checks its status every
//! [`POLL_INTERVAL`]. The returned [`PollHandle`] can be awaited for the
//! transformed outcome, observed through a watch channel, or cancelled.
//!
//! # Guarantees
//! - At most one status request is in flight: the loop awaits each request
//!   before waiting for the next tick, and ticks missed while a slow request
//!   was pending are skipped rather than replayed.
//! - Cancelling or dropping the handle stops the loop at its next await
//!   point. No status update is published after cancellation.
//! - Nothing is retried. A failed status request ends the loop.
//!
//! Progress between 30 and 90 is cosmetic: it grows by [`PROGRESS_STEP`] on
//! every non-terminal tick and never reflects server-side progress.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::contract::{BackendProcessingResult, DocgenApi, TaskState};
use crate::error::{PollError, ValidationError};
use crate::models::{AnalysisStatus, AnalysisStep, FileNode, GeneratedDoc, SectionSummary};
use crate::transform::{transform_file_tree, transform_generated_docs};
use crate::validator::validate;

pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const PROGRESS_STEP: u8 = 5;
pub const PROGRESS_CAP: u8 = 90;

const SCANNING_PROGRESS: u8 = 10;
const ANALYZING_PROGRESS: u8 = 30;

/// Everything produced by a successful analysis, ready for the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub task_id: String,
    /// `None` when the result carried no source analysis; an empty tree is
    /// `Some(vec![])` and still replaces the previous one.
    pub files: Option<Vec<FileNode>>,
    pub docs: Vec<GeneratedDoc>,
    pub summary: SectionSummary,
}

impl AnalysisOutcome {
    pub fn from_result(task_id: String, result: &BackendProcessingResult) -> Self {
        let files = result.source_analysis.as_ref().map(|sa| {
            sa.file_tree
                .as_ref()
                .map(|tree| transform_file_tree(tree, &sa.file_analysis))
                .unwrap_or_default()
        });
        Self {
            task_id,
            files,
            docs: transform_generated_docs(&result.results),
            summary: SectionSummary {
                total: result.total_sections,
                processed: result.processed,
                skipped: result.skipped,
                failed: result.failed,
            },
        }
    }
}

/// Next cosmetic progress value for a non-terminal tick.
pub fn next_progress(current: u8) -> u8 {
    if current < PROGRESS_CAP {
        current.saturating_add(PROGRESS_STEP).min(PROGRESS_CAP)
    } else {
        PROGRESS_CAP
    }
}

/// Starts analyses against a backend client.
pub struct Poller<A: DocgenApi + ?Sized> {
    api: Arc<A>,
}

impl<A: DocgenApi + ?Sized> Clone for Poller<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: DocgenApi + ?Sized + 'static> Poller<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Validate `repo_url` and start polling it in a background task.
    ///
    /// A validation failure never reaches the network. Must be called
    /// from within a Tokio runtime.
    pub fn submit(&self, repo_url: &str) -> Result<PollHandle, ValidationError> {
        if let Err(e) = validate(repo_url) {
            warn!(url = %repo_url, error = %e, "Rejected repository URL");
            return Err(e);
        }

        let (tx, rx) = watch::channel(AnalysisStatus::idle());
        let cancel = CancellationToken::new();
        let publisher = StatusPublisher {
            tx,
            cancel: cancel.clone(),
        };
        let api = Arc::clone(&self.api);
        let url = repo_url.trim().to_string();
        let task_cancel = cancel.clone();

        info!(url = %url, "Submitting repository for analysis");
        let join = tokio::spawn(async move { drive(api, url, publisher, task_cancel).await });

        Ok(PollHandle {
            status: rx,
            cancel,
            join: Some(join),
        })
    }
}

/// Handle to one in-flight analysis. Dropping it cancels the analysis.
pub struct PollHandle {
    status: watch::Receiver<AnalysisStatus>,
    cancel: CancellationToken,
    join: Option<JoinHandle<Result<AnalysisOutcome, PollError>>>,
}

impl PollHandle {
    /// Latest published status.
    pub fn status(&self) -> AnalysisStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status change from now on.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisStatus> {
        self.status.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the analysis to reach a terminal state.
    pub async fn wait(mut self) -> Result<AnalysisOutcome, PollError> {
        let Some(join) = self.join.take() else {
            return Err(PollError::Cancelled);
        };
        match join.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(PollError::Cancelled),
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct StatusPublisher {
    tx: watch::Sender<AnalysisStatus>,
    cancel: CancellationToken,
}

impl StatusPublisher {
    fn publish(&self, status: AnalysisStatus) {
        if self.cancel.is_cancelled() {
            debug!(step = ?status.step, "Dropping status update after cancellation");
            return;
        }
        self.tx.send_replace(status);
    }

    /// Bump the cosmetic progress of the current status, keeping its step
    /// and message.
    fn advance(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.tx.send_modify(|s| s.progress = next_progress(s.progress));
    }

    fn fail(&self, err: PollError) -> PollError {
        self.publish(AnalysisStatus::error(err.to_string()));
        err
    }
}

async fn drive<A: DocgenApi + ?Sized>(
    api: Arc<A>,
    url: String,
    status: StatusPublisher,
    cancel: CancellationToken,
) -> Result<AnalysisOutcome, PollError> {
    status.publish(AnalysisStatus::new(
        AnalysisStep::Scanning,
        "Connecting to API...",
        SCANNING_PROGRESS,
    ));

    let started = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PollError::Cancelled),
        r = api.start_processing(&url) => r,
    };
    let task_id = match started {
        Ok(id) => id,
        Err(e) => {
            error!(url = %url, error = %e, "Failed to start analysis");
            return Err(status.fail(PollError::StartFailed(e)));
        }
    };

    info!(task_id = %task_id, "Analysis task started");
    status.publish(AnalysisStatus::new(
        AnalysisStep::Analyzing,
        "Processing Repository...",
        ANALYZING_PROGRESS,
    ));

    let mut ticker = interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(task_id = %task_id, "Polling cancelled");
                return Err(PollError::Cancelled);
            }
            _ = ticker.tick() => {}
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(task_id = %task_id, "Polling cancelled during status check");
                return Err(PollError::Cancelled);
            }
            r = api.get_status(&task_id) => r,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                error!(task_id = %task_id, error = %e, "Status check failed, stopping poll");
                return Err(status.fail(PollError::ConnectionLost(e)));
            }
        };

        debug!(task_id = %task_id, state = ?response.status, "Polled task status");
        match response.status {
            TaskState::Success => break,
            TaskState::Failed => {
                let reason = response.first_error().unwrap_or("Analysis Failed").to_string();
                warn!(task_id = %task_id, reason = %reason, "Analysis failed on the backend");
                return Err(status.fail(PollError::TaskFailed(reason)));
            }
            TaskState::Pending | TaskState::InProgress => {
                if let Some(message) = &response.message {
                    debug!(task_id = %task_id, message = %message, "Backend progress message");
                }
                status.advance();
            }
        }
    }

    status.publish(AnalysisStatus::new(
        AnalysisStep::Complete,
        "Processing Complete",
        100,
    ));

    let fetched = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PollError::Cancelled),
        r = api.get_result(&task_id) => r,
    };
    let result = match fetched {
        Ok(r) => r,
        Err(e) => {
            error!(task_id = %task_id, error = %e, "Failed to fetch analysis result");
            return Err(status.fail(PollError::ResultFetchFailed(e)));
        }
    };

    let outcome = AnalysisOutcome::from_result(task_id, &result);
    info!(
        task_id = %outcome.task_id,
        files = outcome.files.as_ref().map_or(0, Vec::len),
        docs = outcome.docs.len(),
        "Analysis complete"
    );
    Ok(outcome)
}
