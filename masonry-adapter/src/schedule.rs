use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// Handle for one scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskToken(u64);

/// The deferred work a controller can have outstanding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskKind {
    /// Place the next capped batch of feed items.
    InsertBatch,
    /// Apply queued related-item requests.
    InsertRelated,
    /// Debounced resize: recompute columns and re-pack everything.
    Reflow,
    /// Feed identity changed: rebuild the grid from the feed.
    Rebuild,
    /// Throttled scroll: recompute the viewport window.
    UpdateWindow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Scheduled {
    kind: TaskKind,
    due_ms: u64,
}

/// An owned set of cancellable task tokens.
///
/// Nothing runs by itself: the owner drains due tasks with [`Scheduler::take_due`] from its
/// frame tick. After [`Scheduler::shutdown`] every outstanding task is dropped and nothing new
/// can be scheduled.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    next: u64,
    tasks: BTreeMap<TaskToken, Scheduled>,
    shut_down: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `kind` to run at or after `due_ms`. Returns `None` once shut down.
    pub fn schedule(&mut self, kind: TaskKind, due_ms: u64) -> Option<TaskToken> {
        if self.shut_down {
            return None;
        }
        let token = TaskToken(self.next);
        self.next += 1;
        self.tasks.insert(token, Scheduled { kind, due_ms });
        mtrace!(?kind, due_ms, token = token.0, "schedule");
        Some(token)
    }

    /// Schedules `kind` unless a task of that kind is already outstanding.
    pub fn schedule_once(&mut self, kind: TaskKind, due_ms: u64) -> Option<TaskToken> {
        if let Some(token) = self.pending(kind) {
            return Some(token);
        }
        self.schedule(kind, due_ms)
    }

    /// Cancels any outstanding `kind` task and schedules a new one (debounce).
    pub fn reschedule(&mut self, kind: TaskKind, due_ms: u64) -> Option<TaskToken> {
        self.cancel_kind(kind);
        self.schedule(kind, due_ms)
    }

    pub fn cancel(&mut self, token: TaskToken) -> bool {
        self.tasks.remove(&token).is_some()
    }

    pub fn cancel_kind(&mut self, kind: TaskKind) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.kind != kind);
        before - self.tasks.len()
    }

    pub fn pending(&self, kind: TaskKind) -> Option<TaskToken> {
        self.tasks
            .iter()
            .find(|(_, task)| task.kind == kind)
            .map(|(token, _)| *token)
    }

    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.pending(kind).is_some()
    }

    pub fn due_ms(&self, token: TaskToken) -> Option<u64> {
        self.tasks.get(&token).map(|task| task.due_ms)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Removes and returns every task due at `now_ms`, ordered by due time then scheduling order.
    ///
    /// Tasks scheduled while the returned ones run wait for the next call.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TaskKind> {
        let mut due: Vec<(u64, TaskToken, TaskKind)> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due_ms <= now_ms)
            .map(|(token, task)| (task.due_ms, *token, task.kind))
            .collect();
        due.sort_unstable();
        for (_, token, _) in &due {
            self.tasks.remove(token);
        }
        due.into_iter().map(|(_, _, kind)| kind).collect()
    }

    /// Cancels everything and refuses further scheduling. Returns the number of cancelled tasks.
    pub fn shutdown(&mut self) -> usize {
        let cancelled = self.tasks.len();
        self.tasks.clear();
        self.shut_down = true;
        mdebug!(cancelled, "scheduler shutdown");
        cancelled
    }
}
