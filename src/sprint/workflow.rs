// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Workflow state machine and control channels for a sprint run.
//!
//! State changes go out on a broadcast channel so observers (UIs, tests)
//! can follow along; pause/resume/stop requests come in on a watch channel
//! and are honored between tasks, never mid-task.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

/// Where a sprint run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SprintState {
    NotStarted,
    PreApproval,
    Running,
    CheckpointPaused,
    Completed,
    Failed,
    Cancelled,
}

impl SprintState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SprintState::Completed | SprintState::Failed | SprintState::Cancelled
        )
    }
}

/// Events published while a sprint runs.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    StateChanged { from: SprintState, to: SprintState },
    TaskStarted { task_id: String },
    TaskCompleted { task_id: String },
    TaskFailed { task_id: String, error: String },
    CheckpointReached { completed: u32, total: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: SprintState, to: SprintState },
}

/// External requests observed between tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    Run,
    Pause,
    Stop,
}

/// Owns the state machine for one sprint run.
pub struct WorkflowController {
    state: watch::Sender<SprintState>,
    events: broadcast::Sender<WorkflowEvent>,
    control: watch::Sender<ControlRequest>,
}

impl WorkflowController {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SprintState::NotStarted);
        let (events, _) = broadcast::channel(64);
        let (control, _) = watch::channel(ControlRequest::Run);
        Self {
            state,
            events,
            control,
        }
    }

    pub fn state(&self) -> SprintState {
        *self.state.borrow()
    }

    /// Subscribe to workflow events. Late subscribers miss earlier events.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: WorkflowEvent) {
        // Dropped when nobody is listening, which is fine.
        let _ = self.events.send(event);
    }

    /// Move to `to` if the state machine allows it.
    pub fn transition(&self, to: SprintState) -> Result<(), WorkflowError> {
        let from = self.state();
        if !Self::allowed(from, to) {
            return Err(WorkflowError::InvalidTransition { from, to });
        }
        self.state.send_replace(to);
        self.emit(WorkflowEvent::StateChanged { from, to });
        Ok(())
    }

    fn allowed(from: SprintState, to: SprintState) -> bool {
        use SprintState::*;
        matches!(
            (from, to),
            (NotStarted, PreApproval)
                | (PreApproval, Running)
                | (PreApproval, Cancelled)
                | (Running, CheckpointPaused)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (CheckpointPaused, Running)
                | (CheckpointPaused, Cancelled)
        )
    }

    pub fn request_pause(&self) {
        self.control.send_replace(ControlRequest::Pause);
    }

    pub fn request_resume(&self) {
        self.control.send_replace(ControlRequest::Run);
    }

    pub fn request_stop(&self) {
        self.control.send_replace(ControlRequest::Stop);
    }

    pub fn control(&self) -> ControlRequest {
        *self.control.borrow()
    }

    /// Block until the control channel leaves `Pause`. Returns the request
    /// that ended the wait (`Run` or `Stop`).
    pub async fn wait_for_resume(&self) -> ControlRequest {
        let mut rx = self.control.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if current != ControlRequest::Pause {
                return current;
            }
            // Sender lives in self, so changed() cannot fail here.
            if rx.changed().await.is_err() {
                return ControlRequest::Stop;
            }
        }
    }
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transition_sequence() {
        let controller = WorkflowController::new();
        assert_eq!(controller.state(), SprintState::NotStarted);

        controller.transition(SprintState::PreApproval).unwrap();
        controller.transition(SprintState::Running).unwrap();
        controller.transition(SprintState::CheckpointPaused).unwrap();
        controller.transition(SprintState::Running).unwrap();
        controller.transition(SprintState::Completed).unwrap();
        assert!(controller.state().is_terminal());
    }

    #[test]
    fn test_invalid_transition_is_rejected() {
        let controller = WorkflowController::new();
        let err = controller.transition(SprintState::Completed).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidTransition {
                from: SprintState::NotStarted,
                to: SprintState::Completed,
            }
        );
        // State is unchanged after a rejected transition.
        assert_eq!(controller.state(), SprintState::NotStarted);
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [
            SprintState::Completed,
            SprintState::Failed,
            SprintState::Cancelled,
        ] {
            for to in [
                SprintState::NotStarted,
                SprintState::PreApproval,
                SprintState::Running,
                SprintState::CheckpointPaused,
                SprintState::Completed,
                SprintState::Failed,
                SprintState::Cancelled,
            ] {
                assert!(!WorkflowController::allowed(terminal, to));
            }
        }
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let controller = WorkflowController::new();
        let mut rx = controller.subscribe();

        controller.transition(SprintState::PreApproval).unwrap();

        match rx.recv().await.unwrap() {
            WorkflowEvent::StateChanged { from, to } => {
                assert_eq!(from, SprintState::NotStarted);
                assert_eq!(to, SprintState::PreApproval);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_for_resume_returns_on_run() {
        let controller = std::sync::Arc::new(WorkflowController::new());
        controller.request_pause();

        let waiter = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.wait_for_resume().await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        controller.request_resume();

        assert_eq!(waiter.await.unwrap(), ControlRequest::Run);
    }
}
