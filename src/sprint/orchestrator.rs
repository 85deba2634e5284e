// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Drives a sprint plan through the workflow: gates, sequential task
//! execution, checkpoints, failure recovery and the final review.

use crate::sprint::gates::{
    ApprovalGates, CheckpointDecision, PostSprintDecision, PreSprintDecision, RecoveryDecision,
};
use crate::sprint::monitor::{ConflictMonitor, ProgressMonitor};
use crate::sprint::plan::{SprintPlan, SprintReviewData, SprintTask};
use crate::sprint::workflow::{ControlRequest, SprintState, WorkflowController, WorkflowEvent};
use std::sync::Arc;

/// A task is retried at most this many times before recovery asks again.
pub const MAX_TASK_RETRIES: u32 = 2;

/// Executes one task. Implementations do the actual work; the orchestrator
/// only sequences them.
#[allow(async_fn_in_trait)]
pub trait TaskRunner {
    async fn run(&self, task: &SprintTask) -> anyhow::Result<()>;
}

/// Result of a full sprint run.
#[derive(Debug)]
pub struct SprintOutcome {
    pub state: SprintState,
    pub review: SprintReviewData,
    /// Post-sprint gate verdict. Only meaningful when `state` is
    /// `Completed`; false otherwise.
    pub accepted: bool,
}

pub struct SprintOrchestrator<G, R> {
    gates: G,
    runner: R,
    controller: Arc<WorkflowController>,
}

impl<G: ApprovalGates, R: TaskRunner> SprintOrchestrator<G, R> {
    pub fn new(gates: G, runner: R) -> Self {
        Self {
            gates,
            runner,
            controller: Arc::new(WorkflowController::new()),
        }
    }

    /// Handle to the controller for observing events and requesting
    /// pause/resume/stop from outside the run.
    pub fn controller(&self) -> Arc<WorkflowController> {
        self.controller.clone()
    }

    /// Run the plan to a terminal state. Consumes the orchestrator; a
    /// controller is single-use.
    pub async fn run(self, plan: SprintPlan) -> Result<SprintOutcome, anyhow::Error> {
        let monitor = ProgressMonitor::new();
        let conflicts = ConflictMonitor::analyze(&plan);
        let total_tasks = plan.tasks.len() as u32;
        let mut completed_points = 0u32;

        self.controller.transition(SprintState::PreApproval)?;

        if self.gates.pre_sprint(&plan).await == PreSprintDecision::Cancel {
            self.controller.transition(SprintState::Cancelled)?;
            tracing::info!(sprint_id = %plan.id, "Sprint cancelled before start");
            return Ok(self.outcome(&plan, &monitor, completed_points, conflicts, false));
        }

        if !conflicts.is_empty() {
            tracing::warn!(
                sprint_id = %plan.id,
                conflicts = conflicts.len(),
                "Plan has tasks with overlapping paths"
            );
        }

        self.controller.transition(SprintState::Running)?;

        for task in &plan.tasks {
            // Honor pause/stop between tasks.
            match self.controller.control() {
                ControlRequest::Stop => {
                    self.controller.transition(SprintState::Cancelled)?;
                    return Ok(self.outcome(&plan, &monitor, completed_points, conflicts, false));
                }
                ControlRequest::Pause => {
                    self.controller.transition(SprintState::CheckpointPaused)?;
                    if self.controller.wait_for_resume().await == ControlRequest::Stop {
                        self.controller.transition(SprintState::Cancelled)?;
                        return Ok(self.outcome(
                            &plan,
                            &monitor,
                            completed_points,
                            conflicts,
                            false,
                        ));
                    }
                    self.controller.transition(SprintState::Running)?;
                }
                ControlRequest::Run => {}
            }

            match self.run_task_with_recovery(task, &monitor).await {
                TaskResult::Completed => {
                    completed_points += task.points;
                    let completed = monitor.record_completed();
                    self.controller.emit(WorkflowEvent::TaskCompleted {
                        task_id: task.id.clone(),
                    });

                    if plan.checkpoint_interval > 0
                        && completed % plan.checkpoint_interval == 0
                        && completed < total_tasks
                    {
                        self.controller.emit(WorkflowEvent::CheckpointReached {
                            completed,
                            total: total_tasks,
                        });
                        self.controller.transition(SprintState::CheckpointPaused)?;
                        if self.gates.checkpoint(completed, total_tasks).await
                            == CheckpointDecision::Abort
                        {
                            self.controller.transition(SprintState::Cancelled)?;
                            return Ok(self.outcome(
                                &plan,
                                &monitor,
                                completed_points,
                                conflicts,
                                false,
                            ));
                        }
                        self.controller.transition(SprintState::Running)?;
                    }
                }
                TaskResult::Skipped => {
                    monitor.record_skipped();
                }
                TaskResult::Aborted => {
                    monitor.record_failed();
                    self.controller.transition(SprintState::Failed)?;
                    return Ok(self.outcome(&plan, &monitor, completed_points, conflicts, false));
                }
            }
        }

        self.controller.transition(SprintState::Completed)?;

        let review = self.review(&plan, &monitor, completed_points, conflicts);
        let accepted = self.gates.post_sprint(&review).await == PostSprintDecision::Accept;
        tracing::info!(
            sprint_id = %plan.id,
            completed = review.completed,
            velocity = review.velocity,
            accepted,
            "Sprint finished"
        );

        Ok(SprintOutcome {
            state: self.controller.state(),
            review,
            accepted,
        })
    }

    async fn run_task_with_recovery(
        &self,
        task: &SprintTask,
        monitor: &ProgressMonitor,
    ) -> TaskResult {
        let mut retries = 0u32;
        loop {
            self.controller.emit(WorkflowEvent::TaskStarted {
                task_id: task.id.clone(),
            });

            let error = match self.runner.run(task).await {
                Ok(()) => return TaskResult::Completed,
                Err(e) => e.to_string(),
            };

            tracing::warn!(task_id = %task.id, error = %error, "Task failed");
            self.controller.emit(WorkflowEvent::TaskFailed {
                task_id: task.id.clone(),
                error: error.clone(),
            });

            match self.gates.error_recovery(task, &error).await {
                RecoveryDecision::Retry if retries < MAX_TASK_RETRIES => {
                    retries += 1;
                    monitor.record_retry();
                }
                // Retry budget spent; treat a further Retry as Skip.
                RecoveryDecision::Retry => {
                    monitor.record_failed();
                    return TaskResult::Skipped;
                }
                RecoveryDecision::Skip => {
                    monitor.record_failed();
                    return TaskResult::Skipped;
                }
                RecoveryDecision::Abort => return TaskResult::Aborted,
            }
        }
    }

    fn review(
        &self,
        plan: &SprintPlan,
        monitor: &ProgressMonitor,
        completed_points: u32,
        conflicts: Vec<crate::sprint::monitor::PathConflict>,
    ) -> SprintReviewData {
        let snapshot = monitor.snapshot();
        let hours = (snapshot.elapsed_secs.max(1)) as f64 / 3600.0;
        SprintReviewData {
            sprint_id: plan.id.clone(),
            duration_secs: snapshot.elapsed_secs,
            total_tasks: plan.tasks.len() as u32,
            completed: snapshot.completed,
            failed: snapshot.failed,
            skipped: snapshot.skipped,
            retries: snapshot.retried,
            completed_points,
            velocity: completed_points as f64 / hours,
            conflicts,
        }
    }

    fn outcome(
        &self,
        plan: &SprintPlan,
        monitor: &ProgressMonitor,
        completed_points: u32,
        conflicts: Vec<crate::sprint::monitor::PathConflict>,
        accepted: bool,
    ) -> SprintOutcome {
        SprintOutcome {
            state: self.controller.state(),
            review: self.review(plan, monitor, completed_points, conflicts),
            accepted,
        }
    }
}

enum TaskResult {
    Completed,
    Skipped,
    Aborted,
}
