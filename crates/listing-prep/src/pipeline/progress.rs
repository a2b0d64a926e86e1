//! Progress reporting for batch runs.
//!
//! A run has no cancellation point: it either completes or fails, and the
//! reporter sees a terminal [`ProcessingStage::Complete`] or
//! [`ProcessingStage::Failed`] update either way.

use serde::{Deserialize, Serialize};

/// Stages of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// Mapping sheets onto the canonical record shape
    Normalizing,
    /// Applying the block lists
    Filtering,
    /// Deriving weight and price fields
    Pricing,
    /// Removing exact duplicates
    Deduplicating,
    /// Moving missing-weight rows to the end
    Ordering,
    /// Run completed successfully
    Complete,
    /// Run failed with an error
    Failed,
}

impl ProcessingStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Normalizing => "Normalizing Sheets",
            Self::Filtering => "Filtering Blocked Items",
            Self::Pricing => "Deriving Prices",
            Self::Deduplicating => "Removing Duplicates",
            Self::Ordering => "Ordering Rows",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run spent in this stage.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Normalizing => 0.40,
            Self::Filtering => 0.10,
            Self::Pricing => 0.35,
            Self::Deduplicating => 0.10,
            Self::Ordering => 0.05,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Normalizing => 0.0,
            Self::Filtering => 0.40,
            Self::Pricing => 0.50,
            Self::Deduplicating => 0.85,
            Self::Ordering => 0.95,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: ProcessingStage,

    /// Optional sub-stage description (e.g., "Sheet: Sheet1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    pub fn new(stage: ProcessingStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Progress through an iterative stage, e.g. one sheet of several.
    pub fn with_items(
        stage: ProcessingStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(ProcessingStage::Complete, 1.0, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ProcessingStage::Failed, 0.0, message)
    }
}

/// Receives progress updates from a running pipeline.
///
/// Implementations must be `Send + Sync` so a pipeline can be shared with a
/// worker thread.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(ProcessingStage::Pricing, 0.5, "Pricing...");
        assert_eq!(update.stage, ProcessingStage::Pricing);
        assert!(update.sub_stage.is_none());
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.675).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(
            ProcessingStage::Normalizing,
            "Sheet: Sheet1",
            1,
            4,
            "Normalizing Sheet1",
        );
        assert_eq!(update.sub_stage, Some("Sheet: Sheet1".to_string()));
        assert_eq!(update.stage_progress, 0.25);
        assert_eq!(update.items_processed, Some(1));
        assert_eq!(update.items_total, Some(4));
    }

    #[test]
    fn test_terminal_updates() {
        assert_eq!(ProgressUpdate::complete("Done").progress, 1.0);
        assert_eq!(ProgressUpdate::failed("Boom").stage, ProcessingStage::Failed);
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            ProcessingStage::Normalizing,
            ProcessingStage::Filtering,
            ProcessingStage::Pricing,
            ProcessingStage::Deduplicating,
            ProcessingStage::Ordering,
        ];
        let total: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_stage_json_values() {
        let json = serde_json::to_string(&ProcessingStage::Deduplicating).unwrap();
        assert_eq!(json, "\"deduplicating\"");
    }

    #[test]
    fn test_closure_progress_reporter_across_threads() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = Arc::new(ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let reporter_clone = reporter.clone();
        std::thread::spawn(move || {
            reporter_clone.report(ProgressUpdate::complete("Done"));
        })
        .join()
        .unwrap();

        reporter.report(ProgressUpdate::complete("Done"));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }
}
