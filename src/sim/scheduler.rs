//! Cooperative timer scheduler
//!
//! Replaces per-button intervals with one queue the session drives from its
//! frame loop. Tasks carry the [`TargetKey`] of the button they belong to so
//! a whole button's timers can be cancelled in one call, and so late firings
//! for a remounted button can be recognised and dropped.

use serde::{Deserialize, Serialize};

use super::target::TargetKey;

/// Handle returned when scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// What a task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Maybe drift to a new spot
    Drift,
    /// Maybe start a glitch flicker
    Glitch,
    /// End a glitch flicker
    GlitchRestore,
}

/// A task that came due
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firing {
    pub id: TaskId,
    pub owner: TargetKey,
    pub kind: TimerKind,
    /// Scheduled time of this firing (ms)
    pub due_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Task {
    id: TaskId,
    owner: TargetKey,
    kind: TimerKind,
    due_ms: f64,
    /// Repeat period, `None` for one-shot tasks
    every_ms: Option<f64>,
}

/// Maximum firings a single repeating task may produce per `advance`
const MAX_CATCH_UP: u32 = 8;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Fire once at `now_ms + delay_ms`
    pub fn schedule_once(
        &mut self,
        owner: TargetKey,
        kind: TimerKind,
        now_ms: f64,
        delay_ms: f64,
    ) -> TaskId {
        let id = self.alloc_id();
        self.tasks.push(Task {
            id,
            owner,
            kind,
            due_ms: now_ms + delay_ms.max(0.0),
            every_ms: None,
        });
        id
    }

    /// Fire every `period_ms`, first at `now_ms + period_ms`
    pub fn schedule_every(
        &mut self,
        owner: TargetKey,
        kind: TimerKind,
        now_ms: f64,
        period_ms: f64,
    ) -> TaskId {
        // Guard against a zero period spinning forever
        let period = period_ms.max(1.0);
        let id = self.alloc_id();
        self.tasks.push(Task {
            id,
            owner,
            kind,
            due_ms: now_ms + period,
            every_ms: Some(period),
        });
        log::debug!(
            "Scheduled {:?} for player {} every {}ms",
            kind,
            owner.player,
            period
        );
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Cancel every task belonging to `owner`
    pub fn cancel_owner(&mut self, owner: TargetKey) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != owner);
        before - self.tasks.len()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn has_task(&self, owner: TargetKey, kind: TimerKind) -> bool {
        self.tasks.iter().any(|t| t.owner == owner && t.kind == kind)
    }

    /// Collect every firing due at or before `now_ms`, in due order.
    ///
    /// Repeating tasks are rescheduled; if the host stalled for several
    /// periods a task fires at most [`MAX_CATCH_UP`] times and then skips
    /// ahead.
    pub fn advance(&mut self, now_ms: f64) -> Vec<Firing> {
        let mut firings = Vec::new();

        for task in &mut self.tasks {
            let mut count = 0;
            while task.due_ms <= now_ms {
                firings.push(Firing {
                    id: task.id,
                    owner: task.owner,
                    kind: task.kind,
                    due_ms: task.due_ms,
                });
                count += 1;
                match task.every_ms {
                    Some(period) if count < MAX_CATCH_UP => task.due_ms += period,
                    Some(period) => {
                        let behind = ((now_ms - task.due_ms) / period).floor() + 1.0;
                        task.due_ms += behind * period;
                    }
                    None => {
                        // Mark spent; removed below
                        task.due_ms = f64::INFINITY;
                        break;
                    }
                }
            }
        }

        self.tasks
            .retain(|t| t.every_ms.is_some() || t.due_ms.is_finite());

        firings.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)));
        firings
    }
}
