// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Sprint plan data: what to run and what came of it.

use crate::sprint::monitor::PathConflict;
use serde::{Deserialize, Serialize};

/// A single unit of work in a sprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintTask {
    pub id: String,
    pub name: String,
    /// Story points, used for velocity.
    pub points: u32,
    /// Paths this task expects to modify. Used for conflict analysis.
    #[serde(default)]
    pub touches: Vec<String>,
}

/// An ordered set of tasks with a checkpoint cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintPlan {
    pub id: String,
    pub name: String,
    pub tasks: Vec<SprintTask>,
    /// Ask for a checkpoint approval after every N completed tasks.
    /// Zero disables checkpoints.
    pub checkpoint_interval: u32,
}

impl SprintPlan {
    pub fn new(name: impl Into<String>, tasks: Vec<SprintTask>, checkpoint_interval: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            tasks,
            checkpoint_interval,
        }
    }

    pub fn total_points(&self) -> u32 {
        self.tasks.iter().map(|t| t.points).sum()
    }
}

/// Summary assembled at the end of a run, shown to the post-sprint gate.
#[derive(Debug, Clone, Serialize)]
pub struct SprintReviewData {
    pub sprint_id: String,
    pub duration_secs: u64,
    pub total_tasks: u32,
    pub completed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub retries: u32,
    pub completed_points: u32,
    /// Completed points per hour of wall time.
    pub velocity: f64,
    pub conflicts: Vec<PathConflict>,
}
