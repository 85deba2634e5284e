// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Sprint execution: a plan of tasks run sequentially through an explicit
//! workflow state machine, with human approval gates at the boundaries and
//! progress/conflict monitoring along the way. Library-level, no HTTP
//! surface; callers supply the gates and the task runner.

pub mod gates;
pub mod monitor;
pub mod orchestrator;
pub mod plan;
pub mod workflow;

pub use gates::{
    ApprovalGates, AutoApprove, CheckpointDecision, PostSprintDecision, PreSprintDecision,
    RecoveryDecision,
};
pub use monitor::{ConflictMonitor, PathConflict, ProgressMonitor, ProgressSnapshot};
pub use orchestrator::{SprintOrchestrator, SprintOutcome, TaskRunner, MAX_TASK_RETRIES};
pub use plan::{SprintPlan, SprintReviewData, SprintTask};
pub use workflow::{ControlRequest, SprintState, WorkflowController, WorkflowError, WorkflowEvent};
