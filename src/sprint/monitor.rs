// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Progress counters and plan-level conflict analysis.

use crate::sprint::plan::SprintPlan;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Counters updated as the sprint runs. Cheap to share across tasks.
#[derive(Debug)]
pub struct ProgressMonitor {
    started: Instant,
    completed: AtomicU32,
    failed: AtomicU32,
    skipped: AtomicU32,
    retried: AtomicU32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProgressSnapshot {
    pub completed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub retried: u32,
    pub elapsed_secs: u64,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            completed: AtomicU32::new(0),
            failed: AtomicU32::new(0),
            skipped: AtomicU32::new(0),
            retried: AtomicU32::new(0),
        }
    }

    pub fn record_completed(&self) -> u32 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            elapsed_secs: self.started.elapsed().as_secs(),
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

impl Default for ProgressMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Two or more tasks declaring the same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathConflict {
    pub path: String,
    pub task_ids: Vec<String>,
}

/// Static analysis over a plan's declared paths. Overlaps are surfaced to
/// the review, not blocked.
pub struct ConflictMonitor;

impl ConflictMonitor {
    pub fn analyze(plan: &SprintPlan) -> Vec<PathConflict> {
        let mut by_path: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for task in &plan.tasks {
            for path in &task.touches {
                let ids = by_path.entry(path.as_str()).or_default();
                // A task listing the same path twice is not a conflict.
                if !ids.contains(&task.id.as_str()) {
                    ids.push(task.id.as_str());
                }
            }
        }

        by_path
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(path, ids)| PathConflict {
                path: path.to_string(),
                task_ids: ids.into_iter().map(String::from).collect(),
            })
            .collect()
    }
}
