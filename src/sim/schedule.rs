//! Cancelable timers on the engine's millisecond clock
//!
//! Pending work is kept as data rather than callbacks, so cancelling a task
//! is just dropping it and nothing can fire after the session has moved on.

/// Work the engine defers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// One second of countdown has elapsed
    CountdownTick,
    /// Post-answer delay has elapsed
    ResolveRound { correct: bool },
}

/// Handle for cancelling a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct Scheduled {
    id: TaskId,
    due_ms: u64,
    task: Task,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    /// Kept sorted by (due, id)
    queue: Vec<Scheduled>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task to fire at `due_ms`
    pub fn schedule(&mut self, due_ms: u64, task: Task) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let pos = self
            .queue
            .iter()
            .position(|s| s.due_ms > due_ms)
            .unwrap_or(self.queue.len());
        self.queue.insert(pos, Scheduled { id, due_ms, task });
        id
    }

    /// Drop one task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|s| s.id != id);
        self.queue.len() != before
    }

    /// Drop every pending task
    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    /// Remove and return the earliest task due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, Task)> {
        match self.queue.first() {
            Some(first) if first.due_ms <= now_ms => {
                let s = self.queue.remove(0);
                Some((s.due_ms, s.task))
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_deadline_order() {
        let mut s = Scheduler::new();
        s.schedule(300, Task::CountdownTick);
        s.schedule(100, Task::ResolveRound { correct: true });
        s.schedule(200, Task::ResolveRound { correct: false });

        assert_eq!(s.pop_due(1000), Some((100, Task::ResolveRound { correct: true })));
        assert_eq!(s.pop_due(1000), Some((200, Task::ResolveRound { correct: false })));
        assert_eq!(s.pop_due(1000), Some((300, Task::CountdownTick)));
        assert_eq!(s.pop_due(1000), None);
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(50, Task::CountdownTick);
        s.schedule(50, Task::ResolveRound { correct: true });
        assert_eq!(s.pop_due(50), Some((50, Task::CountdownTick)));
        assert_eq!(s.pop_due(50), Some((50, Task::ResolveRound { correct: true })));
    }

    #[test]
    fn test_not_due_yet() {
        let mut s = Scheduler::new();
        s.schedule(1000, Task::CountdownTick);
        assert_eq!(s.pop_due(999), None);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let tick = s.schedule(1000, Task::CountdownTick);
        s.schedule(1500, Task::ResolveRound { correct: false });

        assert!(s.cancel(tick));
        assert!(!s.cancel(tick));
        assert_eq!(s.len(), 1);
        assert_eq!(s.pop_due(1000), None);

        s.cancel_all();
        assert!(s.is_empty());
        assert_eq!(s.pop_due(u64::MAX), None);
    }
}
