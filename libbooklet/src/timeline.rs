/// Single-threaded timer queue on a virtual clock.
///
/// Tasks due at the same instant come out in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct Timeline<T> {
    now_ms: u64,
    next_seq: u64,
    queue: Vec<Scheduled<T>>,
}

#[derive(Debug, Clone)]
struct Scheduled<T> {
    due_ms: u64,
    seq: u64,
    task: T,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: Vec::new(),
        }
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn schedule(&mut self, after_ms: u32, task: T) {
        self.queue.push(Scheduled {
            due_ms: self.now_ms + u64::from(after_ms),
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// When the earliest task is due.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.iter().map(|s| s.due_ms).min()
    }

    /// Pops the earliest task due at or before `until_ms`, moving the clock
    /// to its due time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(u64, T)> {
        let idx = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due_ms <= until_ms)
            .min_by_key(|(_, s)| (s.due_ms, s.seq))
            .map(|(idx, _)| idx)?;
        let scheduled = self.queue.swap_remove(idx);
        self.now_ms = self.now_ms.max(scheduled.due_ms);
        Some((scheduled.due_ms, scheduled.task))
    }

    /// Moves the clock forward without running anything.
    pub fn advance_clock(&mut self, to_ms: u64) {
        self.now_ms = self.now_ms.max(to_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_then_schedule_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(500, "late");
        timeline.schedule(0, "first");
        timeline.schedule(500, "later");
        timeline.schedule(0, "second");

        let mut out = Vec::new();
        while let Some((at, task)) = timeline.pop_due(u64::MAX) {
            out.push((at, task));
        }
        assert_eq!(
            out,
            vec![(0, "first"), (0, "second"), (500, "late"), (500, "later")]
        );
        assert_eq!(timeline.now_ms(), 500);
    }

    #[test]
    fn nothing_due_before_deadline() {
        let mut timeline = Timeline::new();
        timeline.schedule(720, ());
        assert!(timeline.pop_due(719).is_none());
        assert_eq!(timeline.next_due(), Some(720));
        assert_eq!(timeline.len(), 1);
        assert!(timeline.pop_due(720).is_some());
        assert!(timeline.is_empty());
    }

    #[test]
    fn delays_are_relative_to_now() {
        let mut timeline = Timeline::new();
        timeline.advance_clock(1000);
        timeline.schedule(250, 1);
        assert_eq!(timeline.next_due(), Some(1250));
        timeline.advance_clock(10);
        assert_eq!(timeline.now_ms(), 1000);
    }
}
