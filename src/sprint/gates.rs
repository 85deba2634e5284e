// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Approval gates: the four points where a sprint run blocks on a human
//! (or scripted) decision before proceeding.

use crate::sprint::plan::{SprintPlan, SprintReviewData, SprintTask};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreSprintDecision {
    Proceed,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointDecision {
    Continue,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    Retry,
    Skip,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSprintDecision {
    Accept,
    Reject,
}

/// Decisions a sprint run blocks on. Each call holds the run until the
/// implementation answers.
#[allow(async_fn_in_trait)]
pub trait ApprovalGates {
    /// Before any task runs. `Cancel` ends the sprint as cancelled.
    async fn pre_sprint(&self, plan: &SprintPlan) -> PreSprintDecision;

    /// After every `checkpoint_interval` completed tasks.
    async fn checkpoint(&self, completed: u32, total: u32) -> CheckpointDecision;

    /// After a task fails. `Retry` is bounded by the orchestrator.
    async fn error_recovery(&self, task: &SprintTask, error: &str) -> RecoveryDecision;

    /// After the last task. `Reject` marks the outcome unaccepted but the
    /// sprint still counts as completed.
    async fn post_sprint(&self, review: &SprintReviewData) -> PostSprintDecision;
}

/// Waves everything through. Useful for unattended runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ApprovalGates for AutoApprove {
    async fn pre_sprint(&self, _plan: &SprintPlan) -> PreSprintDecision {
        PreSprintDecision::Proceed
    }

    async fn checkpoint(&self, _completed: u32, _total: u32) -> CheckpointDecision {
        CheckpointDecision::Continue
    }

    async fn error_recovery(&self, _task: &SprintTask, _error: &str) -> RecoveryDecision {
        RecoveryDecision::Skip
    }

    async fn post_sprint(&self, _review: &SprintReviewData) -> PostSprintDecision {
        PostSprintDecision::Accept
    }
}
